//! HTML fragments for the dashboard pages.
//!
//! Charts and maps are drawn by the page layer; this module only emits the
//! text blocks around them (farm sheet, ranking caption, trend box, story
//! page) and the in-page notices that replace a page when it cannot render.

use crate::error::PanelError;
use crate::narrative::NarrativeLoad;
use crate::ranking::{GroupKey, RankPosition};
use crate::record::FarmRecord;
use crate::schema::sentinel;
use crate::trend::{TrendDirection, TrendSummary};

// ── Notices ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message rendered in place of (part of) a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn no_results() -> Self {
        Self::warning(
            "Nenhum resultado encontrado para os filtros aplicados. Tente ajustar os filtros.",
        )
    }

    pub fn insufficient_history(selected: &str) -> Self {
        Self::warning(format!(
            "Não há dados históricos suficientes para analisar tendências de '{selected}' \
             ou há menos de 2 anos de dados."
        ))
    }

    pub fn empty_ranking(ranking_name: &str) -> Self {
        Self::info(format!(
            "Não há dados para o ranking {ranking_name} com o filtro atual."
        ))
    }

    pub fn no_stories() -> Self {
        Self::info("Nenhuma história encontrada ou houve um erro ao carregar as histórias.")
    }

    pub fn to_html(&self) -> String {
        let class = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        format!(
            r#"<div class="notice notice-{class}">{}</div>"#,
            escape_html(&self.message)
        )
    }
}

impl From<&PanelError> for Notice {
    fn from(err: &PanelError) -> Self {
        match err {
            PanelError::SourceNotFound(path) => Notice::error(format!(
                "Erro: O arquivo '{}' não foi encontrado.",
                path.display()
            )),
            PanelError::MissingColumns { missing, found } => Notice::error(format!(
                "Erro: colunas ausentes {missing:?}. Colunas encontradas: {found:?}"
            )),
            other => Notice::error(format!("Erro ao carregar ou processar os dados: {other}")),
        }
    }
}

// ── Farm sheet ──────────────────────────────────────────────────────────────

/// Technical sheet of one family. Missing values read "Não informado".
pub fn farm_sheet_html(record: &FarmRecord) -> String {
    let opt = |v: &Option<String>| {
        v.clone()
            .unwrap_or_else(|| sentinel::NOT_INFORMED.to_string())
    };
    let rows: [(&str, String); 13] = [
        ("Família", record.family.clone()),
        ("Município", record.municipality.clone()),
        ("Comunidade", record.community.clone()),
        ("Gênero Responsável", record.gender.clone()),
        ("Produção Principal", record.primary_product.clone()),
        ("Produção Secundária", opt(&record.secondary_product)),
        ("Certificação", record.certification.clone()),
        ("Área Cultivada (ha)", format!("{:.2} ha", record.area_ha)),
        ("Volume Anual (Kg)", format!("{:.0} Kg", record.volume_kg)),
        ("Método de Venda", opt(&record.sale_method)),
        ("Associação/Cooperativa", opt(&record.association)),
        ("Contato", opt(&record.phone)),
        ("Ano", record.year.to_string()),
    ];

    let mut html = String::from(r#"<div class="ficha-detail">"#);
    for (label, value) in &rows {
        html.push_str(&format!("<b>{}:</b> {}<br>", label, escape_html(value)));
    }
    if let Some(email) = record.email.as_deref().filter(|e| !e.trim().is_empty()) {
        let email = escape_html(email.trim());
        html.push_str(&format!(r#"<a href="mailto:{email}">{email}</a>"#));
    }
    html.push_str("</div>");
    html
}

// ── Rankings and trends ─────────────────────────────────────────────────────

/// Sentence under a ranking chart.
pub fn rank_caption(
    group_key: GroupKey,
    selected: &str,
    ranking_name: &str,
    position: Option<RankPosition>,
) -> String {
    let selected = escape_html(selected);
    let ranking_name = escape_html(ranking_name);
    match position {
        Some(p) => format!(
            "O <b>{group_key} {selected}</b> está na <b>{}ª posição</b> de {} no ranking <b>{ranking_name}</b>.",
            p.position, p.total
        ),
        None => format!(
            "O {group_key} <b>{selected}</b> não possui dados suficientes para ser classificado no ranking {ranking_name}."
        ),
    }
}

/// Growth/decline box above the yearly chart.
pub fn trend_box_html(summary: &TrendSummary) -> String {
    let (color, symbol, text) = match summary.direction {
        TrendDirection::Growth => ("#2a9d8f", "▲", "Crescimento notável"),
        TrendDirection::Decline => ("#e76f51", "▼", "Queda observada"),
        TrendDirection::Stable => ("#6c757d", "▬", "Estabilidade"),
    };
    format!(
        r#"<div class="trend-box" style="border-left:8px solid {color};">
  <b>{text} no período {start}-{end}:</b> <span style="color:{color};">{symbol} {pct:.1}%</span><br>
  Volume inicial: <b>{first} kg</b> | Volume final: <b>{last} kg</b><br>
  <i>Pico de produção em {peak}. Menor produção em {trough}.</i>
</div>"#,
        start = summary.start_year,
        end = summary.end_year,
        pct = summary.percent_change,
        first = thousands(summary.first_value),
        last = thousands(summary.last_value),
        peak = summary.peak_year,
        trough = summary.trough_year,
    )
}

/// Integer part with comma thousands separators.
fn thousands(value: f64) -> String {
    let n = value.trunc() as i64;
    let digits = n.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

// ── Story page ──────────────────────────────────────────────────────────────

/// All narratives, one section each, or a placeholder when there are none.
pub fn story_page_html(load: &NarrativeLoad) -> String {
    let mut html = String::new();
    if let Some(w) = &load.warning {
        html.push_str(&Notice::error(w.clone()).to_html());
    }
    if load.narratives.is_empty() {
        html.push_str(&Notice::no_stories().to_html());
        return html;
    }

    let total = load.narratives.len();
    for (i, n) in load.narratives.iter().enumerate() {
        html.push_str(&format!(
            r#"<section class="story">
  <div class="story-title">{title}</div>
  <span class="frase-destaque">"{quote}"</span>
  <figure><img src="{map_img}"><figcaption>{caption}</figcaption></figure>
  <details><summary>{caption}</summary>{details}</details>
  <figure><img src="{character_img}"><figcaption>Retrato ilustrativo</figcaption></figure>
  <p>{story}</p>
  <blockquote><i>{statement}</i></blockquote>
  <p>{continuation}</p>
  <small>História {index} de {total}</small>
</section>
"#,
            title = escape_html(&n.title),
            quote = escape_html(&n.quote),
            map_img = escape_html(&n.map_image),
            caption = escape_html(&n.map_caption),
            details = escape_html(n.map_details.as_deref().unwrap_or("")),
            character_img = escape_html(&n.character_image),
            story = escape_html(&n.story),
            statement = escape_html(&n.character_statement),
            continuation = escape_html(&n.continuation),
            index = i + 1,
            total = total,
        ));
    }
    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
