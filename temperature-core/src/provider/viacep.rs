use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::model::Address;

use super::{PostalLookup, ProviderError, decode_json};

pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br/ws";

/// Strip `-`, `.` and spaces and require exactly eight ASCII digits.
pub fn normalize_cep(code: &str) -> Result<String, ProviderError> {
    let cep: String = code.chars().filter(|c| !matches!(c, '-' | '.' | ' ')).collect();

    if cep.len() != 8 || !cep.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProviderError::InvalidFormat);
    }

    Ok(cep)
}

/// Postal lookup backed by ViaCEP (`GET {base}/{cep}/json`).
#[derive(Debug, Clone)]
pub struct ViaCepProvider {
    base_url: String,
    http: Client,
}

impl ViaCepProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), http: Client::new() }
    }
}

impl Default for ViaCepProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    cep: String,
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    estado: String,
    #[serde(default)]
    regiao: String,
    #[serde(default)]
    ibge: String,
    #[serde(default)]
    ddd: String,
    /// Present (as `true` or `"true"`) when the code is well formed but unknown.
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_unknown(&self) -> bool {
        match &self.erro {
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

impl From<ViaCepResponse> for Address {
    fn from(raw: ViaCepResponse) -> Self {
        Address {
            postal_code: raw.cep,
            street: raw.logradouro,
            neighborhood: raw.bairro,
            city: raw.localidade,
            state_code: raw.uf,
            state: raw.estado,
            region: raw.regiao,
            ibge_code: raw.ibge,
            area_code: raw.ddd,
        }
    }
}

#[async_trait]
impl PostalLookup for ViaCepProvider {
    #[instrument(skip(self))]
    async fn lookup(&self, code: &str) -> Result<Address, ProviderError> {
        let cep = normalize_cep(code)?;
        let url = format!("{}/{}/json", self.base_url.trim_end_matches('/'), cep);
        debug!(%url, "looking up postal code");

        let res = self.http.get(&url).send().await?;
        let parsed: ViaCepResponse = decode_json(res, "viacep").await?;

        if parsed.is_unknown() {
            return Err(ProviderError::NotFound);
        }

        let address = Address::from(parsed);
        debug!(city = %address.city, state = %address.state_code, "postal code resolved");
        Ok(address)
    }
}
