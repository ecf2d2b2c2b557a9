// ==========================================
// UBP 环境负荷计算系统 - 映射规则表
// ==========================================
// 职责: 映射文档 → 不可变规则表（谓词 → 参考条目）
// 流程: 同义词 → 材料规则 → 通用涂层 → 关键字回退 → 冲突检测
// 红线: 同一优先级同一键只能指向一个条目，否则加载失败
// 红线: 规则目标必须存在于参考库
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::mapping_document::MappingDocument;
use crate::domain::{GeometryType, PrecedenceLevel, ReferenceDatabase, ReferenceEntry, UnitKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

// ==========================================
// 规范化
// ==========================================

/// 材料代码规范化
///
/// TRIM → 大写 → 合并空白 → 各类连字符统一为 `-`（两侧空白去除）
pub fn normalize_material_code(raw: &str) -> String {
    let unified: String = raw
        .chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            other => other,
        })
        .collect();

    let collapsed = unified
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase();

    collapsed.replace(" -", "-").replace("- ", "-")
}

/// 涂层 / 关键字规范化：TRIM → 小写 → 合并空白
pub fn normalize_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ==========================================
// MappingRule - 单条规则
// ==========================================

/// 规则谓词（除材料代码外的限定条件）
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleQualifier {
    /// 无限定（基础材料默认）
    Any,
    Geometry(GeometryType),
    /// 涂层描述包含该词（已规范化）
    Coating(String),
    /// 构件类型文本包含该词
    TypeKeyword(String),
    /// 构件名称包含该词
    DescriptionKeyword(String),
}

impl fmt::Display for RuleQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleQualifier::Any => write!(f, "*"),
            RuleQualifier::Geometry(g) => write!(f, "geometry={}", g),
            RuleQualifier::Coating(c) => write!(f, "coating={}", c),
            RuleQualifier::TypeKeyword(k) => write!(f, "type~{}", k),
            RuleQualifier::DescriptionKeyword(k) => write!(f, "description~{}", k),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingRule {
    pub level: PrecedenceLevel,
    /// 规范材料代码；通用涂层 / 关键字回退为 None
    pub material: Option<String>,
    pub qualifier: RuleQualifier,
    pub target: ReferenceEntry,
}

impl MappingRule {
    /// 冲突判定键
    fn conflict_key(&self) -> (PrecedenceLevel, Option<&str>, &RuleQualifier) {
        (self.level, self.material.as_deref(), &self.qualifier)
    }

    /// 供日志 / 错误展示的规则描述
    pub fn subject(&self) -> String {
        match &self.material {
            Some(m) => format!("{} [{}]", m, self.qualifier),
            None => format!("[{}]", self.qualifier),
        }
    }
}

// ==========================================
// RuleTable - 不可变规则表
// ==========================================
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleTable {
    synonyms: BTreeMap<String, String>,
    /// 按优先级从高到低排序
    rules: Vec<MappingRule>,
}

impl RuleTable {
    /// 构建规则表
    ///
    /// # 参数
    /// - document: 映射规则文档
    /// - database: 参考数据库（校验规则目标）
    ///
    /// # 返回
    /// - Ok(RuleTable): 无冲突的规则表
    /// - Err(ConfigError): 冲突 / 同义词链 / 目标缺失 / 涂层目标非面积单位 / 非法限定 / 空键
    pub fn build(document: &MappingDocument, database: &ReferenceDatabase) -> ConfigResult<Self> {
        let synonyms = Self::build_synonyms(document)?;
        let canonical = |raw: &str| {
            let code = normalize_material_code(raw);
            synonyms.get(&code).cloned().unwrap_or(code)
        };
        let lookup = |subject: String, key: &str| -> ConfigResult<ReferenceEntry> {
            if key.trim().is_empty() {
                return Err(ConfigError::EmptyToken(format!("{} 的目标条目", subject)));
            }
            database
                .get(key)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownReference {
                    rule: subject,
                    key: key.trim().to_string(),
                })
        };
        // 涂层影响按面积计，目标必须是 m² 条目
        let coating_lookup = |subject: String, key: &str| -> ConfigResult<ReferenceEntry> {
            let entry = lookup(subject.clone(), key)?;
            if entry.unit_kind != UnitKind::Area {
                return Err(ConfigError::CoatingUnitMismatch {
                    rule: subject,
                    key: entry.key,
                    unit_kind: entry.unit_kind,
                });
            }
            Ok(entry)
        };

        let mut rules = Vec::new();

        // 1. 材料规则（默认 / 几何覆写 / 材料涂层覆写）
        for (raw_code, mapping) in &document.materials {
            let material = canonical(raw_code);
            if material.is_empty() {
                return Err(ConfigError::EmptyToken("materials 中的材料代码".to_string()));
            }

            if let Some(target) = &mapping.default {
                rules.push(MappingRule {
                    level: PrecedenceLevel::BaseDefault,
                    material: Some(material.clone()),
                    qualifier: RuleQualifier::Any,
                    target: lookup(material.clone(), target)?,
                });
            }

            for (qualifier, target) in &mapping.geometry {
                let geometry = GeometryType::from_key(qualifier)
                    .filter(GeometryType::supports_override)
                    .ok_or_else(|| ConfigError::InvalidQualifier {
                        material: material.clone(),
                        qualifier: qualifier.clone(),
                    })?;
                rules.push(MappingRule {
                    level: PrecedenceLevel::GeometryOverride,
                    material: Some(material.clone()),
                    qualifier: RuleQualifier::Geometry(geometry),
                    target: lookup(format!("{} / {}", material, geometry), target)?,
                });
            }

            for (coating, target) in &mapping.coatings {
                let token = non_empty_token(coating, &material)?;
                rules.push(MappingRule {
                    level: PrecedenceLevel::CoatingOverride,
                    material: Some(material.clone()),
                    target: coating_lookup(format!("{} / {}", material, token), target)?,
                    qualifier: RuleQualifier::Coating(token),
                });
            }
        }

        // 2. 通用涂层
        for (coating, target) in &document.coatings {
            let token = non_empty_token(coating, "coatings")?;
            rules.push(MappingRule {
                level: PrecedenceLevel::GenericCoating,
                material: None,
                target: coating_lookup(format!("coating {}", token), target)?,
                qualifier: RuleQualifier::Coating(token),
            });
        }

        // 3. 关键字回退
        for (idx, fallback) in document.fallbacks.iter().enumerate() {
            let label = format!("fallbacks[{}]", idx);
            if fallback.type_keywords.is_empty() && fallback.description_keywords.is_empty() {
                return Err(ConfigError::EmptyToken(format!("{} 未配置关键字", label)));
            }
            let target = lookup(label.clone(), &fallback.target)?;

            let qualifiers = fallback
                .type_keywords
                .iter()
                .map(|k| non_empty_token(k, &label).map(RuleQualifier::TypeKeyword))
                .chain(
                    fallback
                        .description_keywords
                        .iter()
                        .map(|k| non_empty_token(k, &label).map(RuleQualifier::DescriptionKeyword)),
                );
            for qualifier in qualifiers {
                rules.push(MappingRule {
                    level: PrecedenceLevel::KeywordFallback,
                    material: None,
                    qualifier: qualifier?,
                    target: target.clone(),
                });
            }
        }

        // 4. 冲突检测
        let rules = Self::dedup_and_check(rules)?;

        info!(
            rules = rules.len(),
            synonyms = synonyms.len(),
            "映射规则表构建完成"
        );
        Ok(Self { synonyms, rules })
    }

    fn build_synonyms(document: &MappingDocument) -> ConfigResult<BTreeMap<String, String>> {
        let mut synonyms: BTreeMap<String, String> = BTreeMap::new();
        for (raw_alias, raw_canonical) in &document.synonyms {
            let alias = normalize_material_code(raw_alias);
            let canonical = normalize_material_code(raw_canonical);
            if alias.is_empty() || canonical.is_empty() {
                return Err(ConfigError::EmptyToken("synonyms 中的材料代码".to_string()));
            }
            if alias == canonical {
                continue;
            }

            match synonyms.get(&alias) {
                Some(existing) if *existing != canonical => {
                    return Err(ConfigError::SynonymConflict {
                        alias,
                        first: existing.clone(),
                        second: canonical,
                    });
                }
                Some(_) => debug!(alias = %alias, "重复的同义词定义"),
                None => {
                    synonyms.insert(alias, canonical);
                }
            }
        }

        // 目标本身是别名：别名与目标材料的规则会落到不同规范代码上
        for (alias, canonical) in &synonyms {
            if let Some(next) = synonyms.get(canonical) {
                return Err(ConfigError::SynonymChain {
                    alias: alias.clone(),
                    canonical: canonical.clone(),
                    next: next.clone(),
                });
            }
        }
        Ok(synonyms)
    }

    /// 同键同目标视为重复定义（保留一条），同键异目标即冲突
    fn dedup_and_check(mut rules: Vec<MappingRule>) -> ConfigResult<Vec<MappingRule>> {
        // 优先级降序，其余按键排序（稳定，保证冲突检测与遍历顺序确定）
        rules.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then_with(|| a.material.cmp(&b.material))
                .then_with(|| a.qualifier.cmp(&b.qualifier))
        });

        let mut unique: Vec<MappingRule> = Vec::with_capacity(rules.len());
        for rule in rules {
            if let Some(previous) = unique.last() {
                if previous.conflict_key() == rule.conflict_key() {
                    if previous.target.key != rule.target.key {
                        return Err(ConfigError::RuleConflict {
                            level: rule.level,
                            subject: rule.subject(),
                            first: previous.target.key.clone(),
                            second: rule.target.key,
                        });
                    }
                    debug!(rule = %rule.subject(), "重复的映射规则");
                    continue;
                }
            }
            unique.push(rule);
        }
        Ok(unique)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 原始材料代码 → 规范材料代码（同义词只有一步，构建时已拒绝链式定义）
    pub fn canonical_material(&self, raw: &str) -> String {
        let code = normalize_material_code(raw);
        match self.synonyms.get(&code) {
            Some(canonical) => canonical.clone(),
            None => code,
        }
    }

    /// 全部规则（优先级降序）
    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// 指定优先级的规则
    pub fn rules_at(&self, level: PrecedenceLevel) -> impl Iterator<Item = &MappingRule> {
        self.rules.iter().filter(move |r| r.level == level)
    }

    pub fn synonyms(&self) -> &BTreeMap<String, String> {
        &self.synonyms
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn non_empty_token(raw: &str, context: &str) -> ConfigResult<String> {
    let token = normalize_token(raw);
    if token.is_empty() {
        return Err(ConfigError::EmptyToken(format!("{} 中的空关键字", context)));
    }
    Ok(token)
}
