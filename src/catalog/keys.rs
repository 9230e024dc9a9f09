//! Wire key normalisation.

use std::borrow::Cow;

/// Convert a camelCase wire key to the snake_case name used in schemas.
///
/// An underscore is inserted before an uppercase letter that follows a
/// lowercase letter or digit; keys that are already snake_case are
/// returned unchanged without allocating.
///
/// ```
/// use ocpp_rpc::catalog::camel_to_snake;
///
/// assert_eq!(camel_to_snake("chargePointVendor"), "charge_point_vendor");
/// assert_eq!(camel_to_snake("iso15118SchemaVersion"), "iso15118_schema_version");
/// assert_eq!(camel_to_snake("reservation_id"), "reservation_id");
/// ```
pub fn camel_to_snake(key: &str) -> Cow<'_, str> {
    if !key.bytes().any(|b| b.is_ascii_uppercase()) {
        return Cow::Borrowed(key);
    }

    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if matches!(prev, Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_keys() {
        assert_eq!(camel_to_snake("idTag"), "id_tag");
        assert_eq!(camel_to_snake("connectorId"), "connector_id");
        assert_eq!(camel_to_snake("csChargingProfiles"), "cs_charging_profiles");
        assert_eq!(camel_to_snake("type"), "type");
    }

    #[test]
    fn test_acronyms_and_digits() {
        assert_eq!(camel_to_snake("iso15118CertificateHashData"), "iso15118_certificate_hash_data");
        assert_eq!(camel_to_snake("exiRequest"), "exi_request");
        assert_eq!(camel_to_snake("URL"), "url");
    }

    #[test]
    fn test_snake_case_borrowed() {
        assert!(matches!(camel_to_snake("reservation_id"), Cow::Borrowed(_)));
    }
}
