//! CLI 分派的端到端测试

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wirebox::cli::{command_instance, Args, CliApp, Command, Output};
use wirebox::errors::DispatchError;
use wirebox::{AppConfig, Constructor, Descriptor, Disposable, Instance};

fn app(tokens: &[&str], json: bool) -> CliApp {
    let args = Args {
        json,
        tokens: tokens.iter().map(|t| t.to_string()).collect(),
        ..Args::default()
    };
    let app = CliApp::with_output(args, AppConfig::default(), Output::capture());
    app.bootstrap().unwrap();
    app
}

#[test]
fn no_tokens_prints_help() {
    let app = app(&[], false);
    app.run().unwrap();

    let lines = app.output().captured();
    assert!(lines[0].starts_with("Usage: wirebox"));
    assert!(lines.iter().any(|l| l.contains("services list") && l.contains("(default)")));
    assert!(!lines.iter().any(|l| l.contains("dev-config")));
}

#[test]
fn bare_hierarchical_root_runs_default_listing() {
    let app = app(&["services"], false);
    app.run().unwrap();

    let lines = app.output().captured();
    assert!(lines.contains(&"config (public)".to_string()));
    assert!(lines.contains(&"options (public)".to_string()));
    assert!(lines.contains(&"output".to_string()));
}

#[test]
fn services_list_as_json() {
    let app = app(&["services", "list"], true);
    app.run().unwrap();

    let printed = app.output().captured().join("\n");
    let parsed: serde_json::Value = serde_json::from_str(&printed).unwrap();
    let names: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"config"));
    assert!(names.contains(&"injector"));
}

#[test]
fn commands_list_hides_dev_commands_unless_asked() {
    let app = app(&["COMMANDS"], false);
    app.run().unwrap();
    let lines = app.output().captured();
    assert!(lines.contains(&"help".to_string()));
    assert!(!lines.contains(&"dev-config".to_string()));

    let app = self::app(&["commands", "list", "--all", "--json"], false);
    app.run().unwrap();
    let names: Vec<String> = serde_json::from_str(&app.output().captured().join("\n")).unwrap();
    assert!(names.contains(&"dev-config".to_string()));
    assert!(names.contains(&"services|*list".to_string()));
}

#[test]
fn flag_after_bare_root_reaches_default_listing() {
    let app = app(&["commands", "--all"], false);
    app.run().unwrap();
    let lines = app.output().captured();
    assert!(lines.contains(&"dev-config".to_string()));
    assert!(lines.contains(&"help".to_string()));

    let app = self::app(&["services", "--json"], false);
    app.run().unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&app.output().captured().join("\n")).unwrap();
    let entries = parsed.as_array().unwrap();
    assert!(entries
        .iter()
        .any(|entry| entry["name"] == "config" && entry["public"] == true));
}

#[test]
fn mixed_case_command_is_dispatched() {
    let app = app(&["build"], false);
    app.injector()
        .register_command(
            "Build",
            Constructor::parameterless("Build", || {
                Ok(command_instance(|_: &[String]| -> anyhow::Result<()> {
                    Ok(())
                }))
            }),
        )
        .unwrap();

    app.run().unwrap();
}

#[test]
fn help_lists_commands_that_fail_to_resolve() {
    let app = app(&["help"], false);
    app.injector()
        .register_command(
            "broken",
            Constructor::new("Broken", ["$database"], |_| Ok(Instance::new(()))),
        )
        .unwrap();

    app.run().unwrap();
    let lines = app.output().captured();
    assert!(lines.iter().any(|line| line.trim() == "broken"));
}

#[test]
fn dev_config_prints_toml() {
    let app = app(&["dev-config"], false);
    app.run().unwrap();

    let printed = app.output().captured().join("\n");
    assert!(printed.contains("[injector]"));
    assert!(printed.contains("dependency_sigil"));
    assert!(printed.contains("allow_require_override = false"));
}

#[test]
fn unknown_command_is_reported() {
    let app = app(&["deploy"], false);
    let err = app.run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DispatchError>(),
        Some(DispatchError::UnknownCommand(name)) if name == "deploy"
    ));
}

struct Greet {
    output: Arc<Output>,
}

impl Command for Greet {
    fn execute(&self, args: &[String]) -> anyhow::Result<()> {
        self.output.line(format!("hello {}", args.join(" ")));
        Ok(())
    }
}

#[test]
fn commands_from_extra_modules_get_services_injected() {
    let app = app(&["greet", "to", "you"], false);
    app.loader().add("./greet", || {
        Descriptor::Constructor(Constructor::new("Greet", ["$output"], |deps| {
            Ok(command_instance(Greet {
                output: deps.require::<Output>("output")?,
            }))
        }))
    });
    app.injector().require_command("greet|*to", "./greet").unwrap();

    app.run().unwrap();
    assert_eq!(app.output().captured(), vec!["hello you".to_string()]);
}

#[test]
fn command_with_missing_dependency_fails_to_dispatch() {
    let app = app(&["broken"], false);
    app.injector()
        .register_command(
            "broken",
            Constructor::new("Broken", ["$database"], |_| Ok(Instance::new(()))),
        )
        .unwrap();

    assert!(app.run().is_err());
}

#[derive(Default)]
struct Connection {
    closed: AtomicUsize,
}

impl Disposable for Connection {
    fn dispose(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn shutdown_disposes_services_used_by_commands() {
    let app = app(&["connect"], false);
    let connection = Arc::new(Connection::default());
    app.injector()
        .register("connection", Instance::disposable_arc(connection.clone()));
    app.injector()
        .register_command(
            "connect",
            Constructor::new("Connect", ["$connection"], |deps| {
                deps.require::<Connection>("connection")?;
                Ok(command_instance(|_: &[String]| -> anyhow::Result<()> {
                    Ok(())
                }))
            }),
        )
        .unwrap();

    app.run().unwrap();
    app.shutdown();
    assert_eq!(connection.closed.load(Ordering::SeqCst), 1);
}
