//! Pick the `api-version` of a request from its path.

/// Api version used when no rule matches.
pub const DEFAULT_API_VERSION: &str = "2016-02-01";

/// Resolve the api version for `path`.
///
/// The lowercased path is split on `/` and rules match whole segments only.
pub fn resolve(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    let segments: Vec<&str> = lower.split('/').collect();
    let has = |s: &str| segments.contains(&s);

    if has("microsoft.dbformariadb") {
        "2018-06-01-preview"
    } else if has("microsoft.dbformysql") {
        if has("flexibleservers") {
            "2020-07-01-privatepreview"
        } else {
            "2017-12-01"
        }
    } else if has("microsoft.dbforpostgresql") {
        if has("flexibleservers") {
            "2020-02-14-preview"
        } else {
            "2017-12-01"
        }
    } else if has("microsoft.sql") {
        "2020-08-01-preview"
    } else if has("microsoft.compute") {
        if has("tags") || has("publishers") {
            "2020-06-01"
        } else if has("virtualmachines") {
            "2021-11-01"
        } else if has("skus") {
            "2019-04-01"
        } else {
            "2018-06-01"
        }
    } else if has("microsoft.classiccompute")
        || has("microsoft.classicnetwork")
        || has("microsoft.classicstorage")
    {
        "2016-04-01"
    } else if has("microsoft.network") {
        if has("virtualnetworks") {
            "2018-08-01"
        } else if has("publicipaddresses") {
            "2018-03-01"
        } else if has("frontdoorwebapplicationfirewallpolicies")
            || has("frontdoorwebapplicationfirewallmanagedrulesets")
        {
            "2020-11-01"
        } else if has("applicationgatewaywebapplicationfirewallpolicies") {
            "2021-01-01"
        } else {
            "2018-06-01"
        }
    } else if has("microsoft.storage") {
        if has("storageaccounts") {
            "2016-12-01"
        } else if has("checknameavailability") || has("skus") {
            "2019-04-01"
        } else if has("usages") {
            "2018-07-01"
        } else {
            DEFAULT_API_VERSION
        }
    } else if has("microsoft.billing") {
        "2018-03-01-preview"
    } else if has("microsoft.insights") {
        "2017-03-01-preview"
    } else if has("microsoft.authorization") {
        "2018-01-01-preview"
    } else if has("microsoft.cache") {
        if has("redisenterprise") {
            "2021-03-01"
        } else {
            "2020-06-01"
        }
    } else if has("microsoft.containerservice") {
        "2021-05-01"
    } else if has("microsoft.operationalinsights") {
        "2021-12-01-preview"
    } else {
        DEFAULT_API_VERSION
    }
}
