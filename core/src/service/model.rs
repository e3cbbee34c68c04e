use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Embedding models the comparison service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmbeddingModel {
    #[serde(rename = "VGG-Face")]
    VggFace,
    Facenet,
    #[default]
    Facenet512,
    OpenFace,
    DeepID,
    ArcFace,
    SFace,
}

impl EmbeddingModel {
    pub const ALL: [EmbeddingModel; 7] = [
        EmbeddingModel::VggFace,
        EmbeddingModel::Facenet,
        EmbeddingModel::Facenet512,
        EmbeddingModel::OpenFace,
        EmbeddingModel::DeepID,
        EmbeddingModel::ArcFace,
        EmbeddingModel::SFace,
    ];

    /// Identifier sent as `model_name`.
    pub fn as_str(self) -> &'static str {
        match self {
            EmbeddingModel::VggFace => "VGG-Face",
            EmbeddingModel::Facenet => "Facenet",
            EmbeddingModel::Facenet512 => "Facenet512",
            EmbeddingModel::OpenFace => "OpenFace",
            EmbeddingModel::DeepID => "DeepID",
            EmbeddingModel::ArcFace => "ArcFace",
            EmbeddingModel::SFace => "SFace",
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown embedding model `{0}`")]
pub struct UnknownModel(pub String);

impl FromStr for EmbeddingModel {
    type Err = UnknownModel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EmbeddingModel::ALL
            .iter()
            .copied()
            .find(|model| model.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| UnknownModel(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_facenet512() {
        assert_eq!(EmbeddingModel::default(), EmbeddingModel::Facenet512);
        assert_eq!(EmbeddingModel::ALL[2], EmbeddingModel::default());
    }

    #[test]
    fn parses_wire_names_case_insensitively() {
        assert_eq!("vgg-face".parse(), Ok(EmbeddingModel::VggFace));
        assert_eq!("ArcFace".parse(), Ok(EmbeddingModel::ArcFace));
        assert!("Dlib".parse::<EmbeddingModel>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&EmbeddingModel::VggFace).unwrap();
        assert_eq!(json, "\"VGG-Face\"");
        let model: EmbeddingModel = serde_yaml::from_str("DeepID").unwrap();
        assert_eq!(model, EmbeddingModel::DeepID);
    }
}
