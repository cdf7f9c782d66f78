//! Canonicalisation and HMAC-SHA512 signing of VNPay parameter sets.
//!
//! The canonical form of a parameter set is built by URL-encoding every key and value (spaces become `+`), sorting
//! the pairs by their encoded key in byte order and joining them as `k=v` with `&`. Outbound requests and both
//! inbound callback channels go through exactly this routine.
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha512;
use shop_common::Secret;

pub const SECURE_HASH_FIELD: &str = "vnp_SecureHash";
pub const SECURE_HASH_TYPE_FIELD: &str = "vnp_SecureHashType";

type HmacSha512 = Hmac<Sha512>;

/// URL-encodes a single key or value the way the gateway does.
pub fn encode_component(s: &str) -> String {
    urlencoding::encode(s).replace("%20", "+")
}

/// Builds the canonical query string for the given parameters.
pub fn canonical_query<'a, I>(params: I) -> String
where I: IntoIterator<Item = (&'a str, &'a str)> {
    let mut encoded = params
        .into_iter()
        .map(|(k, v)| (encode_component(k), encode_component(v)))
        .collect::<Vec<(String, String)>>();
    encoded.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    encoded.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<String>>().join("&")
}

#[derive(Clone)]
pub struct VnpaySigner {
    secret: Secret<String>,
}

impl VnpaySigner {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    fn mac(&self) -> HmacSha512 {
        // HMAC accepts keys of any length
        HmacSha512::new_from_slice(self.secret.reveal().as_bytes()).expect("HMAC can take key of any size")
    }

    /// Returns the lower-case hex HMAC-SHA512 of `data`.
    pub fn sign(&self, data: &str) -> String {
        let mut mac = self.mac();
        mac.update(data.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Signs the canonical form of `params`. Returns the canonical query string and its signature.
    pub fn sign_params<'a, I>(&self, params: I) -> (String, String)
    where I: IntoIterator<Item = (&'a str, &'a str)> {
        let query = canonical_query(params);
        let signature = self.sign(&query);
        (query, signature)
    }

    /// Signs the pipe-delimited field list used by the merchant web API.
    pub fn sign_fields(&self, fields: &[&str]) -> String {
        self.sign(&fields.join("|"))
    }

    /// Checks a hex signature against `data` in constant time. Signatures are accepted in either case.
    pub fn verify(&self, data: &str, signature: &str) -> bool {
        let supplied = match hex::decode(signature.trim().to_ascii_lowercase()) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("💳️ Supplied secure hash is not valid hex. {e}");
                return false;
            },
        };
        let mut mac = self.mac();
        mac.update(data.as_bytes());
        mac.verify_slice(&supplied).is_ok()
    }

    /// Strips the secure-hash fields from `params`, recomputes the signature over what remains and compares it with
    /// the supplied one.
    pub fn verify_params<'a, I>(&self, params: I) -> Result<(), crate::VnpayApiError>
    where I: IntoIterator<Item = (&'a str, &'a str)> {
        let mut supplied = None;
        let remaining = params
            .into_iter()
            .filter(|(k, v)| match *k {
                SECURE_HASH_FIELD => {
                    supplied = Some(*v);
                    false
                },
                SECURE_HASH_TYPE_FIELD => false,
                _ => true,
            })
            .collect::<Vec<_>>();
        let supplied = supplied.filter(|s| !s.is_empty()).ok_or(crate::VnpayApiError::MissingSignature)?;
        let query = canonical_query(remaining);
        if self.verify(&query, supplied) {
            Ok(())
        } else {
            Err(crate::VnpayApiError::InvalidSignature)
        }
    }
}
