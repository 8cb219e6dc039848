use std::fs;
use std::path::Path;

use agrofamilia::contacts::contacts_csv;
use agrofamilia::filter::filter_options;
use agrofamilia::pages::{load_page_records, stories_page, trends_page, where_to_buy_page, Page};
use agrofamilia::render::NoticeLevel;
use agrofamilia::schema::{commerce, identity, sentinel};
use agrofamilia::session::clear_filters;
use agrofamilia::{
    apply_filters, load_records, rank, FilterCriteria, FilterField, FilterLock, GroupKey, Measure,
    PanelConfig, PanelError, Reducer, SessionState, Trend,
};

const SURVEY: &str = "\u{feff}Nome da Família ;Município;Comunidade;Gênero Responsável;\
Item de Produção Principal;Item de Produção Secundário;Tipo de Certificação;Área Cultivada (ha);\
Volume Produção Anual (Kg);Método de Venda Principal;Associação/Cooperativa;Telefone;Email;\
Latitude;Longitude;Ano;Estado;Região\r\n\
Silva;Lagarto;Colônia Treze;Feminino;Mandioca;Feijão;Orgânico por Auditoria;2;1200;Feira;Coopertreze;79999990001;silva@exemplo.org;-10.91;-37.65;2021;SE;Nordeste\r\n\
Silva;Lagarto;Colônia Treze;Feminino;Mandioca;Feijão;Orgânico por Auditoria;2;1500;Feira;Coopertreze;79999990001;silva@exemplo.org;-10.91;-37.65;2022;SE;Nordeste\r\n\
Santos;Lagarto;Colônia Treze;Masculino;Hortaliças;;OCS;1.5;800;Cesta;;79999990002;;-10.92;-37.66;2022;SE;Nordeste\r\n\
Oliveira;Itabaiana;Serra;Feminino;Hortaliças;Frutas;;0;500;Feira;;;oliveira@exemplo.org;-10.68;;2021;SE;Nordeste\r\n\
Lima;Juazeiro;Vale;Feminino;Manga;;OCS;5;3000;Mercado;;;;-9.41;-40.50;2022;BA;Nordeste\r\n";

const STORIES: &str = r#"[
  {"titulo": "A roça de Dona Lúcia", "frase_destaque": "Plantar é esperar",
   "mapa_img": "img/lagarto.png", "municipio_texto": "Lagarto (SE)",
   "mapa_texto_detalhado": "Agreste sergipano",
   "personagem_img": "img/lucia.png", "historia": "Lúcia planta mandioca.",
   "fala_personagem": "A terra devolve.", "continua": "E a feira cresce."}
]"#;

fn workspace(survey: Option<&str>, stories: Option<&str>) -> (tempfile::TempDir, PanelConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = PanelConfig::new(dir.path());
    if let Some(body) = survey {
        write(&config.records_path(), body);
    }
    if let Some(body) = stories {
        write(&config.narratives_path(), body);
    }
    (dir, config)
}

fn write(path: &Path, body: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

#[test]
fn load_filter_rank_export() {
    let (_dir, config) = workspace(Some(SURVEY), None);
    let records = load_records(&config).unwrap();
    assert_eq!(records.height(), 5);
    assert!(records.column(identity::FAMILY).is_ok());

    let criteria = FilterCriteria::default().with(FilterField::Municipality, "Lagarto");
    let lagarto = apply_filters(&records, &criteria).unwrap();
    assert_eq!(lagarto.height(), 3);

    let ranking = rank(&records, GroupKey::Municipality, Measure::Volume, Reducer::Sum).unwrap();
    assert_eq!(ranking.entries[0].key, "Lagarto");
    assert_eq!(ranking.entries[0].value, 3500.0);
    assert_eq!(ranking.position_of("Juazeiro").unwrap().position, 2);

    let families =
        rank(&records, GroupKey::Municipality, Measure::Volume, Reducer::DistinctFamilies).unwrap();
    assert_eq!(families.get("Lagarto").unwrap().value, 2.0);

    let csv = String::from_utf8(contacts_csv(&lagarto).unwrap()).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.starts_with("Nome da Família,Município,"));
}

#[test]
fn missing_certification_becomes_selectable_option() {
    let (_dir, config) = workspace(Some(SURVEY), None);
    let records = load_records(&config).unwrap();
    let options = filter_options(&records, commerce::CERTIFICATION).unwrap();
    assert_eq!(options[0], sentinel::ALL);
    assert!(options.contains(&sentinel::NOT_INFORMED.to_string()));
}

#[test]
fn session_filters_survive_between_renders() {
    let (_dir, config) = workspace(Some(SURVEY), None);
    let records = load_records(&config).unwrap();

    let mut session = SessionState::new();
    let mut criteria = FilterCriteria::from_session(&session);
    let mut lock = FilterLock::from_criteria(&criteria);

    assert!(lock.select(&mut criteria, FilterField::Product, "Hortaliças"));
    assert!(!lock.select(&mut criteria, FilterField::Gender, "Feminino"));
    criteria.store_in(&mut session);

    let restored = FilterCriteria::from_session(&session);
    assert_eq!(restored.get(FilterField::Product), "Hortaliças");
    assert_eq!(restored.get(FilterField::Gender), sentinel::ALL);
    assert_eq!(apply_filters(&records, &restored).unwrap().height(), 2);

    clear_filters(&mut session);
    assert!(FilterCriteria::from_session(&session).is_unconstrained());
}

#[test]
fn trends_page_for_growing_municipality() {
    let (_dir, config) = workspace(Some(SURVEY), None);
    let records = load_records(&config).unwrap();
    let page = trends_page(&records, GroupKey::Municipality, "Lagarto", &config).unwrap();

    match &page.trend {
        Trend::Series(s) => {
            assert_eq!((s.start_year, s.end_year), (2021, 2022));
            assert_eq!(s.first_value, 1200.0);
            assert_eq!(s.last_value, 2300.0);
            assert_eq!(s.percent_change, 91.7);
        }
        Trend::Insufficient { .. } => panic!("expected a series"),
    }
    assert!(page.trend_html.contains("Crescimento notável"));
    assert!(page.rankings[0].caption.contains("1ª posição</b> de 3"));
}

#[test]
fn where_to_buy_with_no_match_warns() {
    let (_dir, config) = workspace(Some(SURVEY), None);
    let records = load_records(&config).unwrap();
    let criteria = FilterCriteria::default().with(FilterField::Search, "abacaxi");
    match where_to_buy_page(&records, &criteria).unwrap() {
        Page::Halted(notice) => assert_eq!(notice.level, NoticeLevel::Warning),
        Page::Ready(_) => panic!("expected the no-results notice"),
    }
}

#[test]
fn absent_survey_halts_pages_with_error() {
    let (_dir, config) = workspace(None, None);
    assert!(matches!(
        load_records(&config),
        Err(PanelError::SourceNotFound(_))
    ));
    let page = load_page_records(&config);
    assert_eq!(page.notice().unwrap().level, NoticeLevel::Error);
}

#[test]
fn stories_render_with_details() {
    let (_dir, config) = workspace(None, Some(STORIES));
    let html = stories_page(&config);
    assert!(html.contains("A roça de Dona Lúcia"));
    assert!(html.contains("Agreste sergipano"));
    assert!(html.contains("História 1 de 1"));
}

#[test]
fn malformed_stories_show_placeholder() {
    let (_dir, config) = workspace(None, Some("{ nope"));
    let html = stories_page(&config);
    assert!(html.contains("notice-error"));
    assert!(html.contains("Nenhuma história encontrada"));
}
