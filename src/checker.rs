// Environment consistency checker - cross-references configs against registered modules

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::ModuleInfoParams;
use crate::error::ConsoleError;
use crate::result::RepeaterResult;
use crate::store::{ConfigStore, ModuleStore};

/// Page size used when snapshotting the module catalog for a check.
const CHECK_QUERY_SIZE: usize = 1000;

/// Why a (app_name, environment) pair has no matching instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFailureReason {
    /// The app has zero registered instances anywhere.
    NoModules,
    /// The app has instances, but none under the requested environment.
    EnvironmentMismatch,
}

/// Per-config diagnostic from a full environment check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigCheckDetail {
    pub app_name: String,
    pub environment: String,
    pub matched: bool,
    /// Environments under which this app actually has instances, sorted.
    pub available_environments: Vec<String>,
    pub suggestion: String,
}

/// Aggregate result of checking every stored config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentReport {
    pub has_issues: bool,
    pub issue_count: usize,
    pub total_configs: usize,
    pub details: Vec<ConfigCheckDetail>,
}

/// Result of the narrower "does this one pair match" question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleMatchReport {
    pub has_matches: bool,
    pub match_count: usize,
    pub available_environments: Vec<String>,
    pub reason: Option<MatchFailureReason>,
    pub suggestions: Vec<String>,
}

/// Combined module/config snapshot for one (app_name, environment) pair,
/// produced by the debug analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingAnalysis {
    pub app_name: String,
    pub environment: String,
    pub module_count: usize,
    pub matching_module_count: usize,
    pub config_exists: bool,
    pub available_environments: Vec<String>,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
}

/// What an auto-fix run changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFixReport {
    pub fixed_count: usize,
    pub unfixable_count: usize,
    pub fix_log: Vec<String>,
}

impl AutoFixReport {
    pub fn summary(&self) -> String {
        let mut summary = if self.fixed_count > 0 {
            format!("fixed {} configs. {}", self.fixed_count, self.fix_log.join("; "))
        } else {
            "no fixable configs found".to_string()
        };
        if self.unfixable_count > 0 {
            summary.push_str(&format!(
                " ({} left for manual remediation)",
                self.unfixable_count
            ));
        }
        summary
    }
}

/// Cross-references configured deployment targets against the module
/// catalog and explains (or repairs) mismatches.
pub struct EnvironmentChecker {
    modules: Arc<dyn ModuleStore>,
    configs: Arc<dyn ConfigStore>,
}

impl EnvironmentChecker {
    pub fn new(modules: Arc<dyn ModuleStore>, configs: Arc<dyn ConfigStore>) -> Self {
        Self { modules, configs }
    }

    /// Map each app to the sorted set of environments it has instances in.
    async fn environment_map(&self) -> Result<HashMap<String, BTreeSet<String>>, ConsoleError> {
        let params = ModuleInfoParams {
            size: CHECK_QUERY_SIZE,
            ..Default::default()
        };
        let page = self.modules.select_by_params(&params).await?;
        let mut map: HashMap<String, BTreeSet<String>> = HashMap::new();
        for module in page.data {
            map.entry(module.app_name)
                .or_default()
                .insert(module.environment);
        }
        Ok(map)
    }

    /// Check every stored config against the catalog.
    pub async fn check_environments(&self) -> Result<EnvironmentReport, ConsoleError> {
        let env_map = self.environment_map().await?;
        let all_configs = self.configs.select_all().await?;

        let mut details = Vec::with_capacity(all_configs.len());
        let mut issue_count = 0;
        let total_configs = all_configs.len();

        for config in all_configs {
            let available: Vec<String> = env_map
                .get(&config.app_name)
                .map(|envs| envs.iter().cloned().collect())
                .unwrap_or_default();
            let matched = available.contains(&config.environment);
            let suggestion = if matched {
                "config ok".to_string()
            } else if available.is_empty() {
                issue_count += 1;
                "no modules registered".to_string()
            } else {
                issue_count += 1;
                format!("consider one of: {}", available.join(", "))
            };
            details.push(ConfigCheckDetail {
                app_name: config.app_name,
                environment: config.environment,
                matched,
                available_environments: available,
                suggestion,
            });
        }

        Ok(EnvironmentReport {
            has_issues: issue_count > 0,
            issue_count,
            total_configs,
            details,
        })
    }

    /// Does this one (app_name, environment) pair have any instance? The
    /// two failure reasons drive different remediation suggestions.
    pub async fn check_module_matches(
        &self,
        app_name: &str,
        environment: &str,
    ) -> Result<ModuleMatchReport, ConsoleError> {
        let matched_page = self
            .modules
            .select_by_params(&ModuleInfoParams {
                app_name: Some(app_name.to_string()),
                environment: Some(environment.to_string()),
                size: CHECK_QUERY_SIZE,
                ..Default::default()
            })
            .await?;
        let all_for_app = self.modules.find_by_app(app_name).await?;

        let available: Vec<String> = all_for_app
            .iter()
            .map(|m| m.environment.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let has_matches = matched_page.success && !matched_page.data.is_empty();
        let (reason, suggestions) = if has_matches {
            (None, vec!["match ok, ready to push".to_string()])
        } else if available.is_empty() {
            (
                Some(MatchFailureReason::NoModules),
                vec![
                    "no modules registered for this app".to_string(),
                    "register a module first".to_string(),
                    "check the app name is correct".to_string(),
                ],
            )
        } else {
            (
                Some(MatchFailureReason::EnvironmentMismatch),
                vec![
                    format!(
                        "environment mismatch, change the config environment to one of: {}",
                        available.join(", ")
                    ),
                    format!("or register a new module under environment: {environment}"),
                ],
            )
        };

        Ok(ModuleMatchReport {
            has_matches,
            match_count: matched_page.data.len(),
            available_environments: available,
            reason,
            suggestions,
        })
    }

    /// One-stop diagnostic for "why doesn't my push reach anything":
    /// module presence, environment fit and config existence in a single
    /// snapshot, envelope form. Store faults are folded into the envelope.
    pub async fn debug_matching_analysis(
        &self,
        app_name: &str,
        environment: &str,
    ) -> RepeaterResult<MatchingAnalysis> {
        let all_for_app = match self.modules.find_by_app(app_name).await {
            Ok(modules) => modules,
            Err(e) => return RepeaterResult::fail(format!("failed to query modules: {e}")),
        };
        let config = match self
            .configs
            .find_by_app_and_environment(app_name, environment)
            .await
        {
            Ok(config) => config,
            Err(e) => return RepeaterResult::fail(format!("failed to query config: {e}")),
        };

        let available: Vec<String> = all_for_app
            .iter()
            .map(|m| m.environment.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let matching_module_count = all_for_app
            .iter()
            .filter(|m| m.environment == environment)
            .count();

        let mut issues = Vec::new();
        let mut suggestions = Vec::new();
        if all_for_app.is_empty() {
            issues.push("no modules registered for this app".to_string());
            suggestions.push("register a module first".to_string());
        } else if matching_module_count == 0 {
            issues.push(format!(
                "no module under environment {environment}; modules exist under: {}",
                available.join(", ")
            ));
            suggestions.push(format!(
                "change the config environment to one of: {}",
                available.join(", ")
            ));
        }
        if config.is_none() {
            issues.push("no config stored for this pair".to_string());
            suggestions.push("save a config before pushing".to_string());
        }

        RepeaterResult::ok(MatchingAnalysis {
            app_name: app_name.to_string(),
            environment: environment.to_string(),
            module_count: all_for_app.len(),
            matching_module_count,
            config_exists: config.is_some(),
            available_environments: available,
            issues,
            suggestions,
        })
    }

    /// Best-effort repair: rewrite each mismatched config to its app's
    /// lexicographically smallest available environment. Every fix is an
    /// independent persist; a config that vanished between check and fix is
    /// skipped. Configs whose app has no instances at all are left alone.
    pub async fn auto_fix_environments(&self) -> Result<AutoFixReport, ConsoleError> {
        let report = self.check_environments().await?;
        let mut fixed_count = 0;
        let mut unfixable_count = 0;
        let mut fix_log = Vec::new();

        for detail in report.details.iter().filter(|d| !d.matched) {
            // available_environments is sorted; first entry is the
            // deterministic pick.
            let Some(target) = detail.available_environments.first() else {
                unfixable_count += 1;
                debug!(
                    app_name = %detail.app_name,
                    environment = %detail.environment,
                    "no available environment, left for manual remediation"
                );
                continue;
            };

            // Never clobber a config that already lives under the target
            // key; that one is matched and correct.
            if self
                .configs
                .find_by_app_and_environment(&detail.app_name, target)
                .await?
                .is_some()
            {
                unfixable_count += 1;
                debug!(
                    app_name = %detail.app_name,
                    environment = %detail.environment,
                    target = %target,
                    "target environment already has a config, left for manual remediation"
                );
                continue;
            }

            let Some(existing) = self
                .configs
                .find_by_app_and_environment(&detail.app_name, &detail.environment)
                .await?
            else {
                // Stale check data; the config moved underneath us.
                debug!(
                    app_name = %detail.app_name,
                    environment = %detail.environment,
                    "config gone at fix time, skipped"
                );
                continue;
            };

            let mut fixed = existing;
            let old_environment = std::mem::replace(&mut fixed.environment, target.clone());
            fixed.gmt_modified = Utc::now();
            // The environment is part of the config's identity, so the fix
            // is a re-key: drop the old entry, persist under the new one.
            self.configs
                .delete(&detail.app_name, &old_environment)
                .await?;
            self.configs.save(fixed).await?;
            info!(
                app_name = %detail.app_name,
                from = %old_environment,
                to = %target,
                "auto-fixed config environment"
            );
            fix_log.push(format!(
                "fixed {}: {} -> {}",
                detail.app_name, old_environment, target
            ));
            fixed_count += 1;
        }

        Ok(AutoFixReport {
            fixed_count,
            unfixable_count,
            fix_log,
        })
    }
}
