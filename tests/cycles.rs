mod common;

use std::sync::Arc;

use common::{settle, setup, Recorder};
use servicevisor::{
    EventKind, InstallError, NullService, ServiceContainer, ServiceSpec, State,
};

fn install(container: &ServiceContainer, name: &str, deps: &[&str]) -> Result<(), InstallError> {
    let spec = deps
        .iter()
        .fold(ServiceSpec::new(name, Arc::new(NullService)), |spec, dep| {
            spec.with_dependency(*dep)
        });
    container.install(spec).map(|_| ())
}

fn missing_reports(rec: &Recorder, names: &[&str]) -> Vec<usize> {
    names
        .iter()
        .map(|n| rec.count(n, EventKind::DependencyUninstalled))
        .collect()
}

fn render(err: &InstallError) -> Vec<String> {
    let mut out: Vec<String> = err
        .cycles()
        .iter()
        .map(|c| c.iter().map(|n| n.as_str()).collect::<Vec<_>>().join(" -> "))
        .collect();
    out.sort();
    out
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_cycle_closed_by_an_install_is_reported() {
    let (container, _rec, _log) = setup();
    container
        .install(ServiceSpec::new("B", Arc::new(NullService)).with_dependency("A"))
        .unwrap();
    container
        .install(
            ServiceSpec::new("C", Arc::new(NullService))
                .with_dependency("A")
                .with_dependency("B"),
        )
        .unwrap();

    let err = container
        .install(
            ServiceSpec::new("A", Arc::new(NullService))
                .with_dependency("B")
                .with_dependency("C"),
        )
        .unwrap_err();
    assert_eq!(
        render(&err),
        vec!["A -> B -> A", "A -> C -> A", "A -> C -> B -> A"]
    );
    assert!(err.to_string().starts_with("circular dependency: "));

    // A stays free: installing it without dependencies brings everything up.
    let a = container
        .install(ServiceSpec::new("A", Arc::new(NullService)))
        .unwrap();
    settle(&container).await;
    assert_eq!(a.state(), State::Up);
    assert_eq!(container.service("C").unwrap().state(), State::Up);

    container.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cycles_through_aliases_are_detected() {
    let (container, _rec, _log) = setup();
    container
        .install(
            ServiceSpec::new("store", Arc::new(NullService))
                .with_alias("kv")
                .with_dependency("api"),
        )
        .unwrap();

    let err = container
        .install(ServiceSpec::new("api", Arc::new(NullService)).with_dependency("kv"))
        .unwrap_err();
    assert_eq!(render(&err), vec!["api -> kv -> api"]);

    let err = container
        .install(
            ServiceSpec::new("self", Arc::new(NullService))
                .with_alias("me")
                .with_dependency("me"),
        )
        .unwrap_err();
    assert_eq!(render(&err), vec!["self -> me"]);

    assert_eq!(container.service_names().len(), 1);
    container.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn optional_edges_close_cycles_too() {
    let (container, _rec, _log) = setup();
    let f = container
        .install(ServiceSpec::new("F", Arc::new(NullService)).with_optional_dependency("G"))
        .unwrap();
    f.await_state(State::Up).await.unwrap();

    let err = install(&container, "G", &["F"]).unwrap_err();
    assert_eq!(render(&err), vec!["G -> F -> G"]);

    settle(&container).await;
    assert_eq!(f.state(), State::Up);
    assert!(container.service("G").is_none());
    container.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn rejected_installs_leave_waiting_services_as_they_were() {
    let (container, rec, _log) = setup();
    let waiting = ["A", "B", "C", "D", "L", "M", "O"];

    install(&container, "A", &["B", "F"]).unwrap();
    install(&container, "B", &["C"]).unwrap();
    install(&container, "C", &["D"]).unwrap();
    install(&container, "D", &["E"]).unwrap();
    install(&container, "L", &["M"]).unwrap();
    install(&container, "M", &["N"]).unwrap();
    install(&container, "O", &["L"]).unwrap();
    settle(&container).await;
    let before = missing_reports(&rec, &waiting);
    assert_eq!(before, vec![1; waiting.len()]);

    let err = install(&container, "N", &["H", "O"]).unwrap_err();
    assert_eq!(render(&err), vec!["N -> O -> L -> M -> N"]);
    let err = install(&container, "E", &["C"]).unwrap_err();
    assert_eq!(render(&err), vec!["E -> C -> D -> E"]);

    install(&container, "F", &["G"]).unwrap();
    install(&container, "G", &["H"]).unwrap();
    install(&container, "H", &["I", "W"]).unwrap();
    let err = install(&container, "I", &["H", "J"]).unwrap_err();
    assert_eq!(render(&err), vec!["I -> H -> I"]);
    install(&container, "V", &[]).unwrap();
    install(&container, "K", &["G", "H"]).unwrap();
    install(&container, "W", &[]).unwrap();
    settle(&container).await;

    assert_eq!(missing_reports(&rec, &waiting), before);
    for name in waiting.iter().chain(&["F", "G", "H", "K"]) {
        assert_eq!(container.service(name).unwrap().state(), State::Down, "{name}");
        assert_eq!(rec.count(name, EventKind::DependencyInstalled), 0, "{name}");
    }
    for name in ["V", "W"] {
        assert_eq!(container.service(name).unwrap().state(), State::Up, "{name}");
    }
    for name in ["E", "I", "N"] {
        assert!(container.service(name).is_none(), "{name}");
    }

    container.shutdown().await.unwrap();
}
