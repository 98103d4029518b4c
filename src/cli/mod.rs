//!
//! edudesk dashboard shell
//! -----------------------
//! Interactive interpreter over the identity layer and the mock directory.
//! This is the routing layer of the dashboard: every data view is declared
//! in a static view table with its allowed roles and required permissions,
//! and [`identity::decide`] gates it before anything renders.

pub mod outputformatter;

use std::path::Path;

use anyhow::Result;
use rustyline::error::ReadlineError;
use serde_json::{Map, Value};
use tracing::info;

use crate::directory::{self, Directory, DirectoryProfile, Notice, Resource};
use crate::identity::{
    decide, Access, AuthManager, AuthPhase, DemoAuthProvider, Role, SessionStore, User,
};

struct ViewSpec {
    command: &'static str,
    resource: Resource,
    allowed_roles: &'static [Role],
    required_permissions: &'static [&'static str],
}

/// The dashboard routing table. An empty role list admits every
/// authenticated role; permissions narrow further.
const VIEWS: &[ViewSpec] = &[
    ViewSpec {
        command: "students",
        resource: Resource::Students,
        allowed_roles: &[Role::Admin, Role::Principal, Role::Teacher, Role::Accountant],
        required_permissions: &["students.read"],
    },
    ViewSpec {
        command: "staff",
        resource: Resource::Staff,
        allowed_roles: &[Role::Admin, Role::Principal],
        required_permissions: &["staff.read"],
    },
    ViewSpec {
        command: "attendance",
        resource: Resource::Attendance,
        allowed_roles: &[],
        required_permissions: &["attendance.read"],
    },
    ViewSpec {
        command: "fees",
        resource: Resource::Fees,
        allowed_roles: &[Role::Admin, Role::Principal, Role::Parent, Role::Accountant],
        required_permissions: &["fees.read"],
    },
    ViewSpec {
        command: "homework",
        resource: Resource::Homework,
        allowed_roles: &[],
        required_permissions: &["homework.read"],
    },
    ViewSpec {
        command: "exams",
        resource: Resource::Exams,
        allowed_roles: &[],
        required_permissions: &["exams.read"],
    },
    ViewSpec {
        command: "notices",
        resource: Resource::Notices,
        allowed_roles: &[],
        required_permissions: &["notices.read"],
    },
];

/// Roles and permission gating the notice-posting commands.
const NOTICE_WRITE_ROLES: &[Role] = &[Role::Admin, Role::Principal];
const NOTICE_WRITE_PERMS: &[&str] = &["notices.write"];

fn print_help() {
    eprintln!(
        "Commands:\n  login <email> <password> <role> [--remember]   sign in (demo mode: any non-empty password)\n  logout                                         drop the session\n  whoami                                         show session state\n  switch-role <role>                             demo-only dashboard preview as another role\n  clear-error                                    dismiss the login error banner\n  students|staff|attendance|fees|homework|exams|notices [field=value ...]\n                                                 render a view (filters: exact, or substring for text)\n  post-notice <title...>                         post a notice (admin/principal)\n  remove-notice <id>                             delete a notice (admin/principal)\n  help                                           show this help\n  quit | exit                                    leave the shell\n\nRoles: admin, principal, teacher, student, parent, accountant"
    );
}

/// Build the dashboard wiring and run the interactive shell until EOF/quit.
pub async fn run(state_dir: &str) -> Result<()> {
    let store = SessionStore::open(Path::new(state_dir))?;
    let auth = AuthManager::new(store, Box::new(DemoAuthProvider::new()));
    if let Some(session) = auth.restore_session() {
        println!(
            "Welcome back, {} ({}).",
            session.user.name,
            session.user.role.label()
        );
    }
    let dir = Directory::new(DirectoryProfile::default());
    directory::seed_demo(&dir)?;
    info!("directory seeded, {} students on file", dir.len(Resource::Students));

    let shell = Shell { auth, directory: dir };
    shell.run().await
}

pub struct Shell {
    pub auth: AuthManager,
    pub directory: Directory,
}

impl Shell {
    pub async fn run(&self) -> Result<()> {
        println!("edudesk dashboard shell. Type 'help' for commands.");
        let mut rl = rustyline::DefaultEditor::new()?;
        loop {
            let line = match rl.readline("edudesk> ") {
                Ok(l) => l,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(&line);
            if !self.dispatch(&line).await {
                break;
            }
        }
        Ok(())
    }

    /// Handle one command line; returns false when the shell should exit.
    pub async fn dispatch(&self, line: &str) -> bool {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(&cmd) = tokens.first() else { return true };
        match cmd {
            "help" => print_help(),
            "quit" | "exit" => return false,
            "login" => self.cmd_login(&tokens[1..]).await,
            "logout" => {
                self.auth.logout();
                println!("Signed out.");
            }
            "whoami" => self.cmd_whoami(),
            "switch-role" => self.cmd_switch_role(&tokens[1..]),
            "clear-error" => {
                self.auth.clear_error();
                println!("Error banner cleared.");
            }
            "post-notice" => self.cmd_post_notice(&tokens[1..]).await,
            "remove-notice" => self.cmd_remove_notice(&tokens[1..]).await,
            other => {
                if let Some(view) = VIEWS.iter().find(|v| v.command == other) {
                    self.cmd_view(view, &tokens[1..]).await;
                } else {
                    println!("Unknown command '{}'. Type 'help'.", other);
                }
            }
        }
        true
    }

    async fn cmd_login(&self, args: &[&str]) {
        let remember = args.contains(&"--remember");
        let args: Vec<&str> = args.iter().copied().filter(|a| *a != "--remember").collect();
        let [email, password, role_str] = args[..] else {
            println!("usage: login <email> <password> <role> [--remember]");
            return;
        };
        let Some(role) = Role::parse(role_str) else {
            println!("Unknown role '{}'. Roles: admin, principal, teacher, student, parent, accountant", role_str);
            return;
        };
        println!("Signing in...");
        match self.auth.login(email, password, role, remember).await {
            Ok(session) => {
                println!(
                    "Welcome, {} ({}).{}",
                    session.user.name,
                    session.user.role.label(),
                    if remember { " Session will be remembered." } else { "" }
                );
            }
            Err(e) => println!("Login failed: {} (HTTP {})", e.message(), e.http_status()),
        }
    }

    fn cmd_whoami(&self) {
        let snap = self.auth.snapshot();
        match snap.phase {
            AuthPhase::Anonymous => println!("Not signed in."),
            AuthPhase::Authenticating => println!("Sign-in in progress..."),
            AuthPhase::Authenticated => {
                if let Some(s) = &snap.session {
                    println!(
                        "{} <{}> - {} (rank {})",
                        s.user.name,
                        s.user.email,
                        s.user.role.label(),
                        s.user.role.weight()
                    );
                    println!("permissions: {}", s.user.permissions.join(", "));
                }
            }
        }
        if let Some(err) = &snap.error {
            println!("last error: {}", err);
        }
    }

    fn cmd_switch_role(&self, args: &[&str]) {
        let [role_str] = args[..] else {
            println!("usage: switch-role <role>");
            return;
        };
        let Some(role) = Role::parse(role_str) else {
            println!("Unknown role '{}'.", role_str);
            return;
        };
        let Some(session) = self.auth.session() else {
            println!("Please login first.");
            return;
        };
        if role == session.user.role {
            println!("Already on the {} dashboard.", role.label());
            return;
        }
        // Demo preview: same identity, new role and that role's default grants
        let preview = User::new(
            session.user.id.clone(),
            session.user.name.clone(),
            session.user.email.clone(),
            role,
        );
        let note = if role.outranks(session.user.role) {
            " (previewing a higher-ranked dashboard, demo mode only)"
        } else {
            ""
        };
        match self.auth.update_user(preview) {
            Ok(s) => println!("Now viewing as {}.{}", s.user.role.label(), note),
            Err(e) => println!("Switch failed: {}", e.message()),
        }
    }

    async fn cmd_view(&self, view: &ViewSpec, args: &[&str]) {
        let session = self.auth.session();
        match decide(session.as_ref(), view.allowed_roles, view.required_permissions) {
            Access::RedirectToLogin => {
                println!("Please login first (redirected to login).");
                return;
            }
            Access::Deny => {
                let role = session.map(|s| s.user.role.label()).unwrap_or("unknown");
                println!("Access denied: the {} view is not available to {}.", view.command, role);
                return;
            }
            Access::Allow => {}
        }
        let filters = parse_filters(args);
        match self.directory.get_all(view.resource, &filters).await {
            Ok(rows) => {
                outputformatter::print_records(&rows);
            }
            Err(e) => println!("{} request failed: {} (HTTP {})", view.command, e.message(), e.http_status()),
        }
    }

    async fn cmd_post_notice(&self, args: &[&str]) {
        let session = self.auth.session();
        match decide(session.as_ref(), NOTICE_WRITE_ROLES, NOTICE_WRITE_PERMS) {
            Access::RedirectToLogin => {
                println!("Please login first (redirected to login).");
                return;
            }
            Access::Deny => {
                println!("Access denied: posting notices needs an admin or principal account.");
                return;
            }
            Access::Allow => {}
        }
        if args.is_empty() {
            println!("usage: post-notice <title...>");
            return;
        }
        let notice = Notice {
            id: String::new(), // assigned by the directory
            title: args.join(" "),
            body: String::new(),
            audience: "all".to_string(),
            posted_at: chrono::Utc::now(),
        };
        let record = match directory::model::to_record(&notice) {
            Ok(mut v) => {
                if let Value::Object(map) = &mut v {
                    map.remove("id");
                }
                v
            }
            Err(e) => {
                println!("Could not build notice: {}", e.message());
                return;
            }
        };
        match self.directory.create(Resource::Notices, record).await {
            Ok(created) => println!(
                "Notice posted ({}).",
                created.get("id").and_then(|v| v.as_str()).unwrap_or("?")
            ),
            Err(e) => println!("Posting failed: {} (HTTP {})", e.message(), e.http_status()),
        }
    }

    async fn cmd_remove_notice(&self, args: &[&str]) {
        let session = self.auth.session();
        match decide(session.as_ref(), NOTICE_WRITE_ROLES, NOTICE_WRITE_PERMS) {
            Access::RedirectToLogin => {
                println!("Please login first (redirected to login).");
                return;
            }
            Access::Deny => {
                println!("Access denied: removing notices needs an admin or principal account.");
                return;
            }
            Access::Allow => {}
        }
        let [id] = args[..] else {
            println!("usage: remove-notice <id>");
            return;
        };
        match self.directory.delete(Resource::Notices, id).await {
            Ok(_) => println!("Notice {} removed.", id),
            Err(e) => println!("Removal failed: {} (HTTP {})", e.message(), e.http_status()),
        }
    }
}

/// Parse `field=value` arguments into a filter map. Values that read as
/// numbers or booleans become typed JSON values; everything else stays a
/// string (and gets substring semantics in the directory).
fn parse_filters(args: &[&str]) -> Map<String, Value> {
    let mut filters = Map::new();
    for arg in args {
        let Some((key, raw)) = arg.split_once('=') else {
            continue;
        };
        let value = if raw.eq_ignore_ascii_case("true") {
            Value::Bool(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Value::Bool(false)
        } else if let Ok(n) = raw.parse::<f64>() {
            serde_json::Number::from_f64(n).map(Value::Number).unwrap_or_else(|| Value::String(raw.to_string()))
        } else {
            Value::String(raw.to_string())
        };
        filters.insert(key.to_string(), value);
    }
    filters
}
