/// Column-name constants for the family-farm survey file.
/// Single source of truth - exported to Python via PyO3.

// ── Identity columns ────────────────────────────────────────────────────────
pub mod identity {
    pub const FAMILY: &str = "Nome da Família";
    pub const MUNICIPALITY: &str = "Município";
    pub const COMMUNITY: &str = "Comunidade";
    pub const GENDER: &str = "Gênero Responsável";
    pub const STATE: &str = "Estado";
    pub const REGION: &str = "Região";
}

// ── Geography columns ───────────────────────────────────────────────────────
pub mod geo {
    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
}

// ── Production columns ──────────────────────────────────────────────────────
pub mod production {
    pub const PRIMARY_PRODUCT: &str = "Item de Produção Principal";
    pub const SECONDARY_PRODUCT: &str = "Item de Produção Secundário";
    pub const AREA_HA: &str = "Área Cultivada (ha)";
    pub const VOLUME_KG: &str = "Volume Produção Anual (Kg)";
    pub const YEAR: &str = "Ano";
}

// ── Certification / commerce / contact columns ──────────────────────────────
pub mod commerce {
    pub const CERTIFICATION: &str = "Tipo de Certificação";
    pub const SALE_METHOD: &str = "Método de Venda Principal";
    pub const ASSOCIATION: &str = "Associação/Cooperativa";
    pub const PHONE: &str = "Telefone";
    pub const EMAIL: &str = "Email";
}

// ── Sentinel values ─────────────────────────────────────────────────────────
pub mod sentinel {
    /// Selector value meaning "no constraint".
    pub const ALL: &str = "Todos";
    /// Stand-in for a missing categorical value.
    pub const NOT_INFORMED: &str = "Não informado";
}

/// Columns every survey file must carry.
pub const REQUIRED: [&str; 15] = [
    identity::FAMILY,
    identity::MUNICIPALITY,
    identity::COMMUNITY,
    identity::GENDER,
    production::PRIMARY_PRODUCT,
    production::SECONDARY_PRODUCT,
    commerce::CERTIFICATION,
    production::AREA_HA,
    production::VOLUME_KG,
    commerce::SALE_METHOD,
    commerce::ASSOCIATION,
    commerce::PHONE,
    commerce::EMAIL,
    geo::LATITUDE,
    geo::LONGITUDE,
];

/// Categorical columns normalized to [`sentinel::NOT_INFORMED`] on load.
pub const NORMALIZED: [&str; 8] = [
    identity::FAMILY,
    identity::MUNICIPALITY,
    identity::COMMUNITY,
    identity::GENDER,
    identity::STATE,
    identity::REGION,
    production::PRIMARY_PRODUCT,
    commerce::CERTIFICATION,
];

/// Columns written by the contact export, in order.
pub const CONTACT_EXPORT: [&str; 7] = [
    identity::FAMILY,
    identity::MUNICIPALITY,
    identity::COMMUNITY,
    production::PRIMARY_PRODUCT,
    commerce::CERTIFICATION,
    commerce::PHONE,
    commerce::EMAIL,
];

// ── Derived columns produced by the aggregator ──────────────────────────────
pub mod derived {
    pub const KEY: &str = "key";
    pub const VALUE: &str = "value";
}
