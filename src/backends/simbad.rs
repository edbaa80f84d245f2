//! SIMBAD name resolver
//!
//! Resolves object names through SIMBAD's TAP service by joining the `basic`
//! table with its `ident` alias table. Serves `resolve_target` directly and
//! also acts as the [`TargetResolver`] the archive backends depend on.

use super::adql::{self, Select};
use super::columns;
use super::traits::*;
use crate::config::BackendConfig;
use crate::intents::{Intent, IntentKind};
use crate::network::{HttpClient, TapService};
use crate::results::ResultSet;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const INTENTS: &[IntentKind] = &[IntentKind::ResolveTarget];

/// SIMBAD backend
pub struct Simbad {
    client: HttpClient,
    service: Option<TapService>,
}

impl Simbad {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            service: None,
        }
    }

    fn service(&self) -> Result<&TapService, BackendError> {
        self.service
            .as_ref()
            .ok_or(BackendError::Unavailable(BackendId::Simbad))
    }

    /// Look a name up, failing when SIMBAD does not know it
    async fn lookup(&self, name: &str) -> Result<ResultSet, BackendError> {
        let mut table = self.service()?.query(&identifier_query(name).to_adql()).await?;
        table.rename_columns(columns::SIMBAD);

        if table.is_empty() {
            return Err(BackendError::query_failed(format!(
                "Could not resolve '{}'",
                name.trim()
            )));
        }
        Ok(table)
    }
}

#[async_trait]
impl TargetResolver for Simbad {
    async fn resolve(&self, name: &str) -> Result<Coordinates, BackendError> {
        let table = self.lookup(name).await?;
        let coords = coordinates(&table.rows[0])
            .ok_or_else(|| BackendError::query_failed(format!("SIMBAD has no position for '{}'", name.trim())))?;
        debug!(
            "Resolved {} to {} (RA={}, Dec={})",
            name, coords.main_id, coords.ra_deg, coords.dec_deg
        );
        Ok(coords)
    }
}

#[async_trait]
impl Backend for Simbad {
    fn id(&self) -> BackendId {
        BackendId::Simbad
    }

    fn about(&self) -> BackendAbout {
        BackendAbout::new("Astronomical object name resolution")
            .website("https://simbad.cds.unistra.fr")
            .standard_protocol(true)
    }

    fn intents(&self) -> &[IntentKind] {
        INTENTS
    }

    fn timeout(&self) -> f64 {
        15.0
    }

    fn is_ready(&self) -> bool {
        self.service.is_some()
    }

    fn init(&mut self, config: &BackendConfig) -> anyhow::Result<()> {
        let raw = config
            .url
            .as_deref()
            .ok_or_else(|| anyhow!("no SIMBAD url configured"))?;
        url::Url::parse(raw).with_context(|| format!("invalid SIMBAD url '{}'", raw))?;
        self.service = Some(TapService::new(self.client.clone(), raw));
        Ok(())
    }

    async fn probe(&self) -> Result<(), BackendError> {
        self.service()?
            .query("SELECT TOP 1 main_id FROM basic")
            .await?;
        Ok(())
    }

    async fn execute(&self, intent: &Intent) -> Result<ResultSet, BackendError> {
        match intent {
            Intent::ResolveTarget(p) => {
                let table = self.lookup(&p.target_name).await?;
                let summary = match coordinates(&table.rows[0]) {
                    Some(c) => format!(
                        "Resolved {} to {} at RA={:.4}, Dec={:.4}",
                        p.target_name, c.main_id, c.ra_deg, c.dec_deg
                    ),
                    None => format!("Resolved {} without a position", p.target_name),
                };
                Ok(table.with_summary(summary))
            }
            other => Err(unsupported(BackendId::Simbad, other)),
        }
    }
}

/// Exact identifier lookup in the alias table
pub(crate) fn identifier_query(name: &str) -> Select {
    Select::from("basic JOIN ident ON ident.oidref = basic.oid")
        .top(1)
        .columns(["basic.main_id", "basic.ra", "basic.dec", "basic.otype"])
        .filter(format!("ident.id = {}", adql::quote(name.trim())))
}

fn coordinates(row: &crate::results::Row) -> Option<Coordinates> {
    Some(Coordinates {
        main_id: row.get(columns::TARGET).and_then(Value::as_str)?.to_string(),
        ra_deg: row.get(columns::RA).and_then(Value::as_f64)?,
        dec_deg: row.get(columns::DEC).and_then(Value::as_f64)?,
    })
}
