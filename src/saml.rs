use std::{fmt, io::Write};

use anyhow::Context;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{SecondsFormat, Utc};
use flate2::{Compression, write::DeflateEncoder};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use uuid::Uuid;

use crate::error::{Error, Result};

/// SAML request configuration
#[derive(Debug, Clone)]
pub struct SamlRequest {
    /// The entity that issues the SAML request (typically the application identifier)
    pub issuer: String,
    /// The URL where SAML responses should be sent (Assertion Consumer Service URL)
    pub acs_url: String,
}

impl SamlRequest {
    /// Generate SAML authentication request XML, deflate and base64 encode it
    pub fn generate(&self) -> anyhow::Result<String> {
        let id = format!("id_{}", Uuid::new_v4());
        let instant = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        let xml = format!(
            r#"<samlp:AuthnRequest
  AssertionConsumerServiceURL="{}"
  ID="{id}"
  IssueInstant="{instant}"
  ProtocolBinding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST"
  Version="2.0"
  xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol">
  <saml:Issuer xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion">{}</saml:Issuer>
  <samlp:NameIDPolicy Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress" />
</samlp:AuthnRequest>"#,
            self.acs_url, self.issuer
        );

        encode_saml_request(&xml).context("Failed to encode SAML request")
    }
}

/// Base64 `SAMLResponse` exactly as the IdP produced it
///
/// This is the value STS expects, so it is never re-encoded. It is only good
/// for a few minutes and is never written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct SamlAssertion(String);

impl SamlAssertion {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the base64 payload into a queryable document
    pub fn decode(&self) -> Result<SamlResponse> {
        SamlResponse::from_base64(&self.0)
    }
}

// The blob is a bearer credential
impl fmt::Debug for SamlAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SamlAssertion({} bytes)", self.0.len())
    }
}

/// SAML response (provider-independent)
#[derive(Debug)]
pub struct SamlResponse {
    decoded_xml: Vec<u8>,
}

impl SamlResponse {
    /// Create from Base64-encoded response
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::MalformedAssertion(format!("not valid base64: {e}")))?;
        Ok(Self {
            decoded_xml: decoded,
        })
    }

    /// Get attribute values by name
    ///
    /// Walks the whole document, so a document that is not well-formed fails
    /// even when the attribute appears before the broken part. That includes
    /// a truncated document whose elements are never closed. A missing
    /// attribute yields an empty list.
    pub fn get_attribute_values(&self, attribute_name: &str) -> Result<Vec<String>> {
        let mut reader = Reader::from_reader(self.decoded_xml.as_slice());
        reader.config_mut().trim_text(true);

        let mut values = Vec::new();
        let mut in_target_attribute = false;
        let mut saw_element = false;
        let mut depth: usize = 0;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    saw_element = true;
                    depth += 1;
                    if e.local_name().as_ref() == b"Attribute" {
                        in_target_attribute = check_attribute_name(e, attribute_name);
                    }
                }
                Ok(Event::Empty(_)) => saw_element = true,
                Ok(Event::Text(e)) if in_target_attribute => {
                    values.push(String::from_utf8_lossy(&e).into_owned());
                }
                Ok(Event::End(ref e)) => {
                    depth = depth.saturating_sub(1);
                    if e.local_name().as_ref() == b"Attribute" {
                        in_target_attribute = false;
                    }
                }
                Ok(Event::Eof) if depth > 0 => {
                    return Err(Error::MalformedAssertion(format!(
                        "document ends with {depth} unclosed element(s)"
                    )));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::MalformedAssertion(format!(
                        "error at position {}: {e}",
                        reader.error_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }

        if !saw_element {
            return Err(Error::MalformedAssertion(
                "decoded payload contains no XML element".to_string(),
            ));
        }

        Ok(values)
    }

    /// First value of an attribute, if any
    pub fn get_attribute_value(&self, attribute_name: &str) -> Result<Option<String>> {
        Ok(self
            .get_attribute_values(attribute_name)?
            .into_iter()
            .next())
    }
}

/// Deflate compress and Base64 encode SAML request
fn encode_saml_request(xml: &str) -> anyhow::Result<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(xml.as_bytes())
        .context("Failed to compress SAML request")?;
    let compressed = encoder.finish().context("Failed to finish compression")?;
    Ok(STANDARD.encode(compressed))
}

/// Check if the attribute element has the specified name
fn check_attribute_name(e: &BytesStart, attribute_name: &str) -> bool {
    e.attributes().filter_map(|a| a.ok()).any(|attr| {
        attr.key.as_ref() == b"Name" && attr.value.as_ref() == attribute_name.as_bytes()
    })
}
