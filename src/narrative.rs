use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

/// One hand-authored story shown on the narrative page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Narrative {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "frase_destaque")]
    pub quote: String,
    #[serde(rename = "mapa_img")]
    pub map_image: String,
    #[serde(rename = "municipio_texto")]
    pub map_caption: String,
    #[serde(rename = "mapa_texto_detalhado", default)]
    pub map_details: Option<String>,
    #[serde(rename = "personagem_img")]
    pub character_image: String,
    #[serde(rename = "historia")]
    pub story: String,
    #[serde(rename = "fala_personagem")]
    pub character_statement: String,
    #[serde(rename = "continua")]
    pub continuation: String,
}

/// Narratives plus the warning to surface when loading degraded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeLoad {
    pub narratives: Vec<Narrative>,
    pub warning: Option<String>,
}

/// Read the narrative JSON array. A missing or malformed file yields an
/// empty list and a warning, never an error.
pub fn load_narratives(path: &Path) -> NarrativeLoad {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "narrative file not found");
            return degraded(format!(
                "Erro: O arquivo '{}' não foi encontrado.",
                path.display()
            ));
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "narrative file unreadable");
            return degraded(format!(
                "Erro: O arquivo '{}' não pôde ser lido: {e}",
                path.display()
            ));
        }
    };

    match serde_json::from_str::<Vec<Narrative>>(&text) {
        Ok(narratives) => {
            info!(path = %path.display(), count = narratives.len(), "narratives loaded");
            NarrativeLoad {
                narratives,
                warning: None,
            }
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "narrative file malformed");
            degraded(format!(
                "Erro: O arquivo '{}' não está em um formato JSON válido.",
                path.display()
            ))
        }
    }
}

fn degraded(warning: String) -> NarrativeLoad {
    NarrativeLoad {
        narratives: Vec::new(),
        warning: Some(warning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE_STORY: &str = r#"[{
        "titulo": "Dona Maria e o mel",
        "frase_destaque": "A abelha ensina paciência",
        "mapa_img": "img/mapa_lagarto.png",
        "municipio_texto": "Lagarto (SE)",
        "personagem_img": "img/maria.png",
        "historia": "Maria cria abelhas há vinte anos.",
        "fala_personagem": "Sem veneno a gente vive melhor.",
        "continua": "Hoje ela vende na feira."
    }]"#;

    #[test]
    fn parses_portuguese_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historias.json");
        std::fs::write(&path, ONE_STORY).unwrap();

        let load = load_narratives(&path);
        assert!(load.warning.is_none());
        assert_eq!(load.narratives.len(), 1);
        let n = &load.narratives[0];
        assert_eq!(n.title, "Dona Maria e o mel");
        assert_eq!(n.map_caption, "Lagarto (SE)");
        assert!(n.map_details.is_none());
    }

    #[test]
    fn missing_file_degrades_to_empty_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let load = load_narratives(&dir.path().join("historias.json"));
        assert!(load.narratives.is_empty());
        assert!(load.warning.unwrap().contains("não foi encontrado"));
    }

    #[test]
    fn malformed_json_degrades_to_empty_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historias.json");
        std::fs::write(&path, "[{\"titulo\": ").unwrap();
        let load = load_narratives(&path);
        assert!(load.narratives.is_empty());
        assert!(load.warning.unwrap().contains("JSON"));
    }
}
