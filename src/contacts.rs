use polars::prelude::*;
use tracing::debug;
use url::form_urlencoded::byte_serialize;

use crate::error::Result;
use crate::record::FarmRecord;
use crate::schema::CONTACT_EXPORT;

/// Download name of the contact export.
pub const EXPORT_FILE_NAME: &str = "contatos_agricultores.csv";

/// Re-serialize the contact columns of `records` as comma-separated UTF-8
/// with a header row.
pub fn contacts_csv(records: &DataFrame) -> Result<Vec<u8>> {
    let mut table = records.select(CONTACT_EXPORT)?;
    let mut buf = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut table)?;
    debug!(rows = table.height(), bytes = buf.len(), "contact export written");
    Ok(buf)
}

/// `mailto:` link asking the family about their main product.
pub fn email_link(record: &FarmRecord) -> Option<String> {
    let email = record.email.as_deref()?.trim();
    if email.is_empty() {
        return None;
    }
    let subject = format!(
        "Interesse em produtos de {} - Família {} ({})",
        record.primary_product, record.family, record.municipality
    );
    let body = format!(
        "Olá, família {} de {},\n\n\
         Gostaria de saber mais sobre a disponibilidade e os preços dos seus produtos de {}.\n\
         Por favor, me envie informações sobre como posso adquirir seus produtos e as formas de entrega.\n\n\
         Obrigado(a)!",
        record.family, record.municipality, record.primary_product
    );
    Some(format!(
        "mailto:{email}?subject={}&body={}",
        encode(&subject),
        encode(&body)
    ))
}

/// Map search link for the family's coordinates.
pub fn directions_link(record: &FarmRecord) -> Option<String> {
    let (lat, lon) = record.coordinates()?;
    Some(format!(
        "https://www.google.com/maps/search/?api=1&query={lat},{lon}"
    ))
}

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}
