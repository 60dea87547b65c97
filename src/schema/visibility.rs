//! Per-attribute output decision.
//!
//! [`is_visible`] is the single place where the returned policy, the
//! mutability and the caller's attribute selection meet. The engine asks it
//! once per attribute and once per sub-attribute of every emitted complex
//! value.

use super::types::{AttributeDefinition, Mutability, Returned};
use crate::resource::{AttributeRef, Context, ResolvedSelection};

/// Whether a present value for `definition` is written to the output.
///
/// In order:
///
/// 1. `returned: never` is never written.
/// 2. `writeOnly` values are never written in responses, nor in query and
///    search requests where they could only be read back.
/// 3. `returned: always` is written whatever the selection says.
/// 4. `readOnly` values are left out of create, replace and patch requests.
/// 5. `returned: request` is written only when the selection names it.
/// 6. `returned: default` is written unless excluded, or unless an
///    `attributes` allow-list is present and does not name it.
pub fn is_visible(
    definition: &AttributeDefinition,
    at: AttributeRef<'_>,
    context: Context,
    selection: &ResolvedSelection,
) -> bool {
    let visible = match definition.returned {
        Returned::Never => false,
        _ if definition.mutability == Mutability::WriteOnly
            && (context.is_response() || context.is_read_request()) =>
        {
            false
        }
        Returned::Always => true,
        _ if definition.mutability == Mutability::ReadOnly && context.is_write_request() => false,
        Returned::Request => selection.includes(at),
        Returned::Default => {
            !selection.excludes(at) && (!selection.has_included() || selection.includes(at))
        }
    };

    log::trace!(
        "{}{}{} {} in {} context",
        at.attribute,
        if at.sub_attribute.is_some() { "." } else { "" },
        at.sub_attribute.unwrap_or_default(),
        if visible { "emitted" } else { "omitted" },
        context
    );
    visible
}
