use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::thread;
use tempfile::TempDir;

const ANALYSIS_BODY: &str = r#"{
    "result": {
        "code_activity": {"rating": 8, "comment": "Weekly releases"},
        "smart_contract_risk": {"rating": 1.5, "comment": "Unverified contract"},
        "token_performance": {"rating": 4, "comment": "Thin liquidity"},
        "social_sentiment": {"rating": 5, "comment": "Mixed", "error": "Reddit API unavailable"},
        "risk_reward_ratio": 1.8,
        "confidence_score": 30,
        "final_recommendation": "Avoid",
        "timestamp": "2025-04-20 16:45:00"
    },
    "has_trading_prompt": true
}"#;

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("cryptosentinel");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }
}

fn run_cli(env: &CliTestEnv, args: &[&str], api_url: Option<&str>) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("cryptosentinel-cli"));
    let mut command = Command::new(bin_path);

    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("RUST_LOG");
    match api_url {
        Some(url) => command.env("CRYPTOSENTINEL_API_URL", url),
        None => command.env_remove("CRYPTOSENTINEL_API_URL"),
    };

    command
        .output()
        .unwrap_or_else(|e| panic!("failed to execute cryptosentinel-cli: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "cryptosentinel-cli {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

/// Serve canned JSON for `/api/analyze` and `/api/reset`, returning the base URL
fn start_stub_service(expected: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    thread::spawn(move || {
        for _ in 0..expected {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let request = read_request(&mut stream);
            let body = if request.starts_with("POST /api/analyze ") {
                ANALYSIS_BODY
            } else if request.starts_with("POST /api/reset ") {
                r#"{"status":"success","message":"Session reset successfully"}"#
            } else {
                r#"{"detail":"Not Found"}"#
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    base_url
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while let Ok(n) = stream.read(&mut buf) {
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let content_length = head
                .lines()
                .find_map(|l| {
                    l.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .and_then(|v| v.trim().parse::<usize>().ok())
                })
                .unwrap_or(0);
            if body.len() >= content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).to_string()
}

fn dead_url() -> String {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    format!("http://127.0.0.1:{}", port)
}

#[test]
fn config_shows_default_service_url() {
    let env = CliTestEnv::new();

    let output = run_cli(&env, &["config"], None);
    assert_success(&["config"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Service URL:   http://localhost:8000"),
        "unexpected config output:\n{stdout}"
    );
    assert!(stdout.contains("Timeout:       none"));
}

#[test]
fn config_file_and_env_override() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[service]
base_url = "http://analysis.internal:9000/"
timeout_secs = 45
"#,
    );

    let output = run_cli(&env, &["config"], None);
    assert_success(&["config"], &output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Service URL:   http://analysis.internal:9000"));
    assert!(stdout.contains("Timeout:       45s"));

    let output = run_cli(&env, &["config"], Some("http://10.0.0.5:8000"));
    assert_success(&["config"], &output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Service URL:   http://10.0.0.5:8000"));
}

#[test]
fn invalid_service_url_is_rejected() {
    let env = CliTestEnv::new();

    let output = run_cli(&env, &["config"], Some("ftp://example.com"));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to load configuration"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn health_reports_unreachable_service() {
    let env = CliTestEnv::new();

    let output = run_cli(&env, &["health"], Some(&dead_url()));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is not healthy"), "unexpected stderr:\n{stderr}");
}

#[test]
fn analyze_rejects_blank_address() {
    let env = CliTestEnv::new();

    let output = run_cli(&env, &["analyze", "   "], Some(&dead_url()));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("token address must not be empty"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn analyze_reports_unreachable_service() {
    let env = CliTestEnv::new();

    let output = run_cli(&env, &["analyze", "0xABC"], Some(&dead_url()));
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("analysis failed"), "unexpected stderr:\n{stderr}");
}

#[test]
fn analyze_prints_metrics_and_declines_trade() {
    let env = CliTestEnv::new();
    let url = start_stub_service(2);
    let args = ["analyze", "0xABC", "--decide", "no"];

    let output = run_cli(&env, &args, Some(&url));
    assert_success(&args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Code Activity"), "stdout:\n{stdout}");
    assert!(stdout.contains("8 / 10  [good]"), "stdout:\n{stdout}");
    assert!(stdout.contains("1.5 / 10  [critical]"), "stdout:\n{stdout}");
    assert!(stdout.contains("30 / 100  [warning]"), "stdout:\n{stdout}");
    assert!(stdout.contains("Social Sentiment: Reddit API unavailable"));
    assert!(stdout.contains("Recommendation: Avoid"));
    assert!(stdout.contains("Result: Session reset successfully"));
}

#[test]
fn analyze_json_output() {
    let env = CliTestEnv::new();
    let url = start_stub_service(1);
    let args = ["analyze", "0xABC", "--format", "json"];

    let output = run_cli(&env, &args, Some(&url));
    assert_success(&args, &output);

    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(json["analysis"]["result"]["final_recommendation"], "Avoid");
    assert_eq!(json["analysis"]["has_trading_prompt"], true);
    assert!(json["session_id"].as_str().is_some_and(|s| !s.is_empty()));
    assert!(json["outcome"].is_null());
}
