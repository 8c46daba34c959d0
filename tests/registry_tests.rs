//! Module registry behavior: heartbeat upsert, install validation and
//! remote gating, status transitions, reload, removal guards, queries.

mod common;

use std::sync::Arc;

use common::{healthy_agent, module, module_store, ScriptedAgentClient};
use repeater_console::{
    AgentEndpoints, AgentResponse, ConsoleError, HeartbeatReport, InstallParams, ModuleInfoParams,
    ModuleRegistry, ModuleStatus, ModuleStore,
};

fn registry_with(agent: Arc<ScriptedAgentClient>) -> (Arc<dyn ModuleStore>, ModuleRegistry) {
    let store = module_store();
    let registry = ModuleRegistry::new(store.clone(), agent, AgentEndpoints::default());
    (store, registry)
}

fn heartbeat(app: &str, ip: &str) -> HeartbeatReport {
    HeartbeatReport {
        app_name: app.to_string(),
        ip: ip.to_string(),
        port: "12580".to_string(),
        environment: Some("prod".to_string()),
        version: None,
        status: None,
    }
}

#[tokio::test]
async fn report_creates_then_refreshes_without_duplicating() {
    let (store, registry) = registry_with(healthy_agent());

    let first = registry.report(heartbeat("web", "10.0.0.1")).await.unwrap();
    assert_eq!(first.version, "unknown");
    assert_eq!(first.status, ModuleStatus::Active);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = registry.report(heartbeat("web", "10.0.0.1")).await.unwrap();

    // Same identity, createdAt preserved, heartbeat advanced
    assert_eq!(second.gmt_create, first.gmt_create);
    assert!(second.gmt_modified > first.gmt_modified);

    let page = store
        .select_by_params(&ModuleInfoParams::for_app("web"))
        .await
        .unwrap();
    assert_eq!(page.count, 1);
}

#[tokio::test]
async fn report_updates_status_and_version_when_supplied() {
    let (_, registry) = registry_with(healthy_agent());
    registry.report(heartbeat("web", "10.0.0.1")).await.unwrap();

    let mut update = heartbeat("web", "10.0.0.1");
    update.status = Some(ModuleStatus::Frozen);
    update.version = Some("2.0.0".to_string());
    let updated = registry.report(update).await.unwrap();
    assert_eq!(updated.status, ModuleStatus::Frozen);
    assert_eq!(updated.version, "2.0.0");

    // Empty version strings are ignored, not written through
    let mut blank = heartbeat("web", "10.0.0.1");
    blank.version = Some(String::new());
    let kept = registry.report(blank).await.unwrap();
    assert_eq!(kept.version, "2.0.0");
}

#[tokio::test]
async fn install_validates_required_fields_and_port_range() {
    let (_, registry) = registry_with(healthy_agent());

    let missing = registry
        .install(InstallParams {
            app_name: String::new(),
            ip: "10.0.0.1".to_string(),
            port: None,
            environment: None,
        })
        .await;
    assert!(matches!(missing, Err(ConsoleError::Validation(_))));

    for bad_port in ["0", "65536", "not-a-port"] {
        let result = registry
            .install(InstallParams {
                app_name: "web".to_string(),
                ip: "10.0.0.1".to_string(),
                port: Some(bad_port.to_string()),
                environment: None,
            })
            .await;
        assert!(
            matches!(result, Err(ConsoleError::Validation(_))),
            "port {bad_port} should be rejected"
        );
    }

    for (ip, good_port) in [("10.0.0.2", "1"), ("10.0.0.3", "65535")] {
        let module = registry
            .install(InstallParams {
                app_name: "web".to_string(),
                ip: ip.to_string(),
                port: Some(good_port.to_string()),
                environment: None,
            })
            .await
            .unwrap();
        assert_eq!(module.port, good_port);
    }
}

#[tokio::test]
async fn install_defaults_port_and_environment_and_resolves_version() {
    let (_, registry) = registry_with(healthy_agent());
    let module = registry
        .install(InstallParams {
            app_name: "web".to_string(),
            ip: "10.0.0.1".to_string(),
            port: None,
            environment: None,
        })
        .await
        .unwrap();
    assert_eq!(module.port, "12580");
    assert_eq!(module.environment, "default");
    assert_eq!(module.version, "1.4.0");
    assert_eq!(module.status, ModuleStatus::Active);
}

#[tokio::test]
async fn install_rejects_duplicate_key_regardless_of_other_fields() {
    let (_, registry) = registry_with(healthy_agent());
    registry
        .install(InstallParams {
            app_name: "web".to_string(),
            ip: "10.0.0.1".to_string(),
            port: None,
            environment: None,
        })
        .await
        .unwrap();

    let duplicate = registry
        .install(InstallParams {
            app_name: "web".to_string(),
            ip: "10.0.0.1".to_string(),
            port: Some("9000".to_string()),
            environment: Some("staging".to_string()),
        })
        .await;
    assert!(matches!(
        duplicate,
        Err(ConsoleError::AlreadyRegistered { .. })
    ));
}

#[tokio::test]
async fn install_fails_without_persisting_when_agent_unreachable() {
    let agent = Arc::new(ScriptedAgentClient::new());
    let (store, registry) = registry_with(agent);

    let result = registry
        .install(InstallParams {
            app_name: "web".to_string(),
            ip: "10.0.0.1".to_string(),
            port: None,
            environment: None,
        })
        .await;
    assert!(matches!(result, Err(ConsoleError::RemoteUnreachable { .. })));
    assert!(store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn install_fails_when_repeater_detail_missing() {
    // Liveness answers, the module detail does not
    let agent = Arc::new(
        ScriptedAgentClient::new()
            .with_rule("sandbox-module-mgr/list", AgentResponse::ok("ok")),
    );
    let (store, registry) = registry_with(agent);

    let result = registry
        .install(InstallParams {
            app_name: "web".to_string(),
            ip: "10.0.0.1".to_string(),
            port: None,
            environment: None,
        })
        .await;
    assert!(matches!(result, Err(ConsoleError::RemoteUnreachable { .. })));
    assert!(store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn frozen_persists_only_after_remote_confirmation() {
    let (store, registry) = registry_with(healthy_agent());
    registry.report(heartbeat("web", "10.0.0.1")).await.unwrap();

    let frozen = registry.frozen("web", "10.0.0.1").await.unwrap();
    assert_eq!(frozen.status, ModuleStatus::Frozen);

    let stored = store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ModuleStatus::Frozen);

    let active = registry.active("web", "10.0.0.1").await.unwrap();
    assert_eq!(active.status, ModuleStatus::Active);
}

#[tokio::test]
async fn state_change_leaves_local_record_untouched_on_remote_failure() {
    let agent = Arc::new(
        ScriptedAgentClient::new()
            .with_rule("frozen?ids=repeater", AgentResponse::failure("agent down")),
    );
    let (store, registry) = registry_with(agent);
    registry.report(heartbeat("web", "10.0.0.1")).await.unwrap();

    let result = registry.frozen("web", "10.0.0.1").await;
    assert!(matches!(result, Err(ConsoleError::RemoteUnreachable { .. })));

    let stored = store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ModuleStatus::Active);
}

#[tokio::test]
async fn state_change_on_unknown_module_is_not_found() {
    let (_, registry) = registry_with(healthy_agent());
    let result = registry.active("web", "10.9.9.9").await;
    assert!(matches!(result, Err(ConsoleError::ModuleNotFound { .. })));
}

#[tokio::test]
async fn reload_updates_heartbeat_and_confirms_activation() {
    let (store, registry) = registry_with(healthy_agent());
    let before = registry.report(heartbeat("web", "10.0.0.1")).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let outcome = registry.reload("web", "10.0.0.1").await.unwrap();
    assert!(outcome.module_active);
    assert!(outcome.to_string().contains("status: ok"));

    let stored = store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.gmt_modified > before.gmt_modified);
}

#[tokio::test]
async fn reload_failure_does_not_mutate_state() {
    let agent = Arc::new(
        ScriptedAgentClient::new()
            .with_rule("repeater/reload", AgentResponse::failure("boom")),
    );
    let (store, registry) = registry_with(agent);
    let before = registry.report(heartbeat("web", "10.0.0.1")).await.unwrap();

    let result = registry.reload("web", "10.0.0.1").await;
    assert!(matches!(result, Err(ConsoleError::RemoteUnreachable { .. })));

    let stored = store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.gmt_modified, before.gmt_modified);
}

#[tokio::test]
async fn remove_rejects_port_mismatch_and_leaves_instance() {
    let (store, registry) = registry_with(healthy_agent());
    store.save(module("web", "10.0.0.1", "prod")).await.unwrap();

    let result = registry.remove("web", "10.0.0.1", Some("9999")).await;
    assert!(matches!(result, Err(ConsoleError::Validation(_))));
    assert!(store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .is_some());

    registry
        .remove("web", "10.0.0.1", Some("12580"))
        .await
        .unwrap();
    assert!(store
        .find_by_app_and_ip("web", "10.0.0.1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn query_filters_by_subset_and_pages() {
    let (store, registry) = registry_with(healthy_agent());
    store.save(module("web", "10.0.0.1", "prod")).await.unwrap();
    store.save(module("web", "10.0.0.2", "staging")).await.unwrap();
    store.save(module("api", "10.0.0.3", "prod")).await.unwrap();

    let page = registry
        .query(&ModuleInfoParams::for_app("web"))
        .await
        .unwrap();
    assert!(page.success);
    assert_eq!(page.count, 2);

    let scoped = registry
        .query(&ModuleInfoParams::for_app_and_environment("web", "staging"))
        .await
        .unwrap();
    assert_eq!(scoped.data.len(), 1);
    assert_eq!(scoped.data[0].ip, "10.0.0.2");

    // Empty pages come back unsuccessful; push and checker rely on this
    let none = registry
        .query(&ModuleInfoParams::for_app("missing"))
        .await
        .unwrap();
    assert!(!none.success);
    assert!(none.data.is_empty());
}

#[tokio::test]
async fn envelope_queries_report_data_not_exist() {
    let (store, registry) = registry_with(healthy_agent());
    store.save(module("web", "10.0.0.1", "prod")).await.unwrap();

    let hit = registry.query_one("web", "10.0.0.1").await;
    assert!(hit.success);

    let miss = registry.query_one("web", "10.0.0.9").await;
    assert!(!miss.success);
    assert_eq!(miss.message, "data not exist");

    let by_app = registry.query_by_app("nothing").await;
    assert!(!by_app.success);
}

#[tokio::test]
async fn debug_dump_returns_whole_catalog_in_envelope() {
    let (store, registry) = registry_with(healthy_agent());

    // An empty catalog is still a successful dump, not a fault
    let empty = registry.debug_query_all_modules().await;
    assert!(empty.success);
    assert!(empty.data.unwrap().is_empty());

    store.save(module("web", "10.0.0.1", "prod")).await.unwrap();
    store.save(module("api", "10.0.0.2", "staging")).await.unwrap();

    let dump = registry.debug_query_all_modules().await;
    assert!(dump.success);
    let data = dump.data.unwrap();
    assert_eq!(data.len(), 2);
    // Dump order follows the catalog's identity key
    assert_eq!(data[0].app_name, "api");
    assert_eq!(data[1].app_name, "web");
}
