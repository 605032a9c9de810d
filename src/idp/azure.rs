
/// Azure Entra ID (formerly Azure AD) provider implementation
#[derive(Debug, Clone)]
pub struct AzureProvider {
    tenant_id: String,
}

impl AzureProvider {
    pub fn new(tenant_id: String) -> Self {
        Self { tenant_id }
    }

    /// SAML-P redirect binding endpoint of the tenant
    pub fn build_auth_url(&self, saml_request: &str) -> String {
        format!(
            "https://login.microsoftonline.com/{}/saml2?SAMLRequest={}",
            urlencoding::encode(&self.tenant_id),
            urlencoding::encode(saml_request)
        )
    }
}
