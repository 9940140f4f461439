use anyhow::Result;
use reqwest::Client;
use serde_json::Value;

const REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Package metadata URL; scoped names are encoded (`@scope/pkg` → `%40scope%2Fpkg`).
pub fn package_url(name: &str, version: &str) -> String {
    let encoded_name = name.replace('@', "%40").replace('/', "%2F");
    format!("{}/{}/{}", REGISTRY_URL, encoded_name, version)
}

/// Raw license declaration from a registry version document: `license`,
/// or the legacy `licenses` array.
pub fn license_field(document: &Value) -> Option<Value> {
    ["license", "licenses"]
        .iter()
        .filter_map(|key| document.get(*key))
        .find(|v| !v.is_null() && v.as_str() != Some(""))
        .cloned()
}

/// Fetch the raw license declaration of `name@version` from the npm registry.
pub async fn fetch_license(client: &Client, name: &str, version: &str) -> Result<Option<Value>> {
    let response = client
        .get(package_url(name, version))
        .header("User-Agent", concat!("license-audit/", env!("CARGO_PKG_VERSION")))
        .header("Accept", "application/json")
        .send()
        .await?;

    if !response.status().is_success() {
        return Ok(None);
    }

    let document: Value = response.json().await?;
    Ok(license_field(&document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scoped_package_url() {
        assert_eq!(
            package_url("@babel/core", "7.24.0"),
            "https://registry.npmjs.org/%40babel%2Fcore/7.24.0"
        );
        assert_eq!(
            package_url("ms", "2.1.3"),
            "https://registry.npmjs.org/ms/2.1.3"
        );
    }

    #[test]
    fn test_license_field_prefers_license() {
        let doc = json!({ "license": "MIT", "licenses": [{ "type": "ISC" }] });
        assert_eq!(license_field(&doc), Some(json!("MIT")));

        let legacy = json!({ "license": "", "licenses": [{ "type": "ISC" }] });
        assert_eq!(license_field(&legacy), Some(json!([{ "type": "ISC" }])));

        assert_eq!(license_field(&json!({ "name": "x" })), None);
    }
}
