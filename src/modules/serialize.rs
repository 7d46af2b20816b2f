use serde::{Deserialize, Serialize};
use std::fs;
use crate::modules::api::SiteConfig;
use crate::modules::stub::StoredElement;

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ElementFile {
    #[serde(default, rename = "element")]
    pub elements: Vec<StoredElement>,
}

pub fn load_config(path: &str) -> Result<SiteConfig, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&text)?;
    Ok(config)
}

pub fn load_elements(path: &str) -> Result<Vec<StoredElement>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let file: ElementFile = toml::from_str(&text)?;
    Ok(file.elements)
}

pub fn save_elements(path: &str, elements: &[StoredElement]) -> Result<(), Box<dyn std::error::Error>> {
    let file = ElementFile { elements: elements.to_vec() };
    let toml_str = toml::to_string_pretty(&file)?;
    fs::write(path, toml_str)?;
    Ok(())
}

pub fn is_not_found(err: &Box<dyn std::error::Error>) -> bool {
    err.downcast_ref::<std::io::Error>()
        .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
        .unwrap_or(false)
}
