// ==========================================
// UBP 环境负荷计算系统 - 映射规则文档
// ==========================================
// 格式: JSON
// {
//   "synonyms":  { "<别名>": "<标准材料代码>" },
//   "materials": { "<材料代码>": { "default": "<条目>",
//                                "geometry": { "profile": "<条目>", "sheet": "<条目>" },
//                                "coatings": { "<涂层>": "<条目>" } } },
//   "coatings":  { "<涂层>": "<条目>" },
//   "fallbacks": [ { "target": "<条目>", "type_keywords": [..], "description_keywords": [..] } ]
// }
// 红线: 文档内重复键保留原样，由规则表构建时判定冲突
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;
use tracing::info;

/// 有序键值对（保留重复键）
pub type Entries<T> = Vec<(String, T)>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingDocument {
    #[serde(default, deserialize_with = "map_entries")]
    pub synonyms: Entries<String>,
    #[serde(default, deserialize_with = "map_entries")]
    pub materials: Entries<MaterialMapping>,
    #[serde(default, deserialize_with = "map_entries")]
    pub coatings: Entries<String>,
    #[serde(default)]
    pub fallbacks: Vec<KeywordFallbackMapping>,
}

/// 单一材料代码的规则组
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialMapping {
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default, deserialize_with = "map_entries")]
    pub geometry: Entries<String>,
    #[serde(default, deserialize_with = "map_entries")]
    pub coatings: Entries<String>,
}

/// 关键字回退规则（材料代码为空时生效）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordFallbackMapping {
    pub target: String,
    #[serde(default)]
    pub type_keywords: Vec<String>,
    #[serde(default)]
    pub description_keywords: Vec<String>,
}

impl MappingDocument {
    pub fn from_json_str(raw: &str, source: &str) -> ConfigResult<Self> {
        serde_json::from_str(raw).map_err(|e| ConfigError::ParseError {
            path: source.to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let document = Self::from_json_str(&raw, &path.display().to_string())?;
        info!(
            file = %path.display(),
            materials = document.materials.len(),
            coatings = document.coatings.len(),
            fallbacks = document.fallbacks.len(),
            "映射规则文档读取完成"
        );
        Ok(document)
    }
}

fn map_entries<'de, D, T>(deserializer: D) -> Result<Entries<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct EntriesVisitor<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
        type Value = Entries<T>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a JSON object")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, T>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}
