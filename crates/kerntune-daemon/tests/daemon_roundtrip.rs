//! End-to-end exercise over a real Unix socket: a daemon serving a temp
//! filesystem tree, driven through the typed client.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use kerntune_client::DaemonClient;
use kerntune_daemon::config::DaemonConfig;
use kerntune_daemon::server;
use kerntune_daemon::state::DaemonState;
use kerntune_ipc::ParamWrite;
use tokio::sync::Notify;

fn seed_tree(root: &Path) {
    let cpufreq = root.join("sys/devices/system/cpu/cpu0/cpufreq");
    fs::create_dir_all(cpufreq.join("ondemand")).unwrap();
    fs::create_dir_all(cpufreq.join("stats")).unwrap();
    fs::write(cpufreq.join("scaling_governor"), "performance\n").unwrap();
    fs::write(cpufreq.join("scaling_cur_freq"), "550000\n").unwrap();
    fs::write(cpufreq.join("scaling_max_freq"), "600000\n").unwrap();
    fs::write(cpufreq.join("ondemand/sampling_rate"), "150000\n").unwrap();
    fs::write(cpufreq.join("stats/time_in_state"), "600000 120\n550000 30\n").unwrap();

    fs::create_dir_all(root.join("proc/sys/net/ipv4")).unwrap();
    fs::write(root.join("proc/loadavg"), "0.12 0.10 0.05 1/80 4242\n").unwrap();
}

struct TestDaemon {
    root: tempfile::TempDir,
    shutdown: Arc<Notify>,
}

async fn start_daemon() -> (TestDaemon, DaemonClient) {
    let root = tempfile::tempdir().unwrap();
    seed_tree(root.path());

    let config = DaemonConfig {
        socket_path: root.path().join("kerntuned.sock"),
        fs_root: root.path().to_path_buf(),
        sticky_dir: Some(root.path().join("sticky")),
        appmgr_socket: root.path().join("appmgr.sock"),
    };
    let state = Arc::new(DaemonState::new(config.clone()));
    let listener = server::bind(&config.socket_path).unwrap();

    let shutdown = Arc::new(Notify::new());
    let server_shutdown = Arc::clone(&shutdown);
    tokio::spawn(server::run(listener, state, server_shutdown));

    let client = DaemonClient::connect(&config.socket_path, "roundtrip-test", "0.0.0")
        .await
        .unwrap();

    (
        TestDaemon { root, shutdown },
        client,
    )
}

#[tokio::test]
async fn reads_and_writes_round_trip_over_the_socket() {
    let (daemon, mut client) = start_daemon().await;

    client.status().await.unwrap();
    assert_eq!(client.scaling_cur_freq().await.unwrap(), 550000);
    assert_eq!(client.scaling_governor().await.unwrap(), "performance");
    assert_eq!(
        client.proc_loadavg().await.unwrap(),
        vec!["0.12 0.10 0.05 1/80 4242".to_string()]
    );

    client.set_tcp_congestion_control("westwood").await.unwrap();
    assert_eq!(
        client.tcp_congestion_control().await.unwrap(),
        vec!["westwood".to_string()]
    );

    let params = client.cpufreq_params(None).await.unwrap();
    let names: Vec<&str> = params.params.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"scaling_max_freq"));

    daemon.shutdown.notify_waiters();
}

#[tokio::test]
async fn governor_switch_applies_governor_params() {
    let (daemon, mut client) = start_daemon().await;

    client
        .set_cpufreq_params(
            vec![ParamWrite {
                name: "scaling_governor".to_string(),
                value: "ondemand".to_string(),
            }],
            vec![ParamWrite {
                name: "sampling_rate".to_string(),
                value: "200000".to_string(),
            }],
        )
        .await
        .unwrap();

    let params = client.cpufreq_params(Some("ondemand")).await.unwrap();
    assert_eq!(params.governor.as_deref(), Some("ondemand"));
    let rate = params
        .params
        .iter()
        .find(|p| p.name == "sampling_rate")
        .unwrap();
    assert_eq!(rate.value, "200000");

    daemon.shutdown.notify_waiters();
}

#[tokio::test]
async fn invalid_requests_surface_as_errors_not_disconnects() {
    let (daemon, mut client) = start_daemon().await;

    let err = client
        .set_tcp_congestion_control("cubic; rm -rf /")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("bad request"));

    // The connection survives a rejected request.
    client.status().await.unwrap();

    let err = client.cpufreq_params(Some("powersave")).await.unwrap_err();
    assert!(err.to_string().contains("expected failure"));

    daemon.shutdown.notify_waiters();
}

#[tokio::test]
async fn sticky_scripts_are_written_and_removed() {
    let (daemon, mut client) = start_daemon().await;

    client
        .stick_cpufreq_params(
            vec![ParamWrite {
                name: "scaling_governor".to_string(),
                value: "ondemand".to_string(),
            }],
            vec![],
        )
        .await
        .unwrap();

    let script = daemon.root.path().join("sticky/kerntune-cpufreq");
    assert!(script.exists());
    let content = fs::read_to_string(&script).unwrap();
    assert!(content.contains("prevBootPanicked"));

    client.unstick_cpufreq_params().await.unwrap();
    assert!(!script.exists());

    daemon.shutdown.notify_waiters();
}
