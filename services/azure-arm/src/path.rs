//! Turn relative ARM paths into subscription scoped paths.

use azrest_core::{Error, Result};

/// Paths sent without any subscription prefix.
const VERBATIM: [&str; 2] = ["subscriptions", "providers/Microsoft.Billing/enrollmentAccounts"];
/// Resources living directly below `subscriptions/<sub>/`.
const SUBSCRIPTION_CHILDREN: [&str; 3] = ["locations", "resourcegroups", "providers"];

fn is_verbatim(resource: &str) -> bool {
    resource.starts_with("subscriptions/")
        || resource.starts_with("/subscriptions/")
        || VERBATIM.contains(&resource)
}

/// Check whether `resource` needs a subscription to be addressed.
pub(crate) fn needs_subscription(resource: &str) -> bool {
    !is_verbatim(resource)
}

/// Normalize an ARM path, leading `/` already trimmed:
///
/// - `subscriptions/...`, `subscriptions` and the billing enrollment accounts stay as they are.
/// - `locations`, `resourcegroups` and `providers` become `subscriptions/<sub>/<resource>`.
/// - Everything else becomes `subscriptions/<sub>/providers/<resource>`.
pub(crate) fn normalize_path(resource: &str, subscription_id: Option<&str>) -> Result<String> {
    if is_verbatim(resource) {
        return Ok(resource.to_string());
    }

    let sub = subscription_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::no_subscription(format!("no subscription selected for {resource}")))?;
    if SUBSCRIPTION_CHILDREN
        .iter()
        .any(|r| r.eq_ignore_ascii_case(resource))
    {
        Ok(format!("subscriptions/{sub}/{resource}"))
    } else {
        Ok(format!("subscriptions/{sub}/providers/{resource}"))
    }
}
