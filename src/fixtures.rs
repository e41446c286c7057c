#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use crate::record;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Server {
        pub name: String,
        pub port: i64,
        pub id: i64,
        pub labels: Vec<i32>,
        pub enabled: bool,
        pub users: Vec<String>,
        pub postgres: Postgres,
        pub _unexported: String,
        pub interval: Duration,
    }

    record! {
        Server {
            name: value.required(),
            port: value.default("6060"),
            id: value,
            labels: value,
            enabled: value,
            users: value,
            postgres: record::<Postgres>,
            _unexported: value,
            interval: value,
        }
    }

    /// Postgres connection settings.
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Postgres {
        pub enabled: bool,
        pub port: i64,
        pub hosts: Vec<String>,
        pub db_name: String,
        pub availability_ratio: f64,
        pub _unexported: String,
    }

    record! {
        Postgres {
            enabled: value,
            port: value.required(),
            hosts: value.required(),
            db_name: value.default("configdb"),
            availability_ratio: value,
            _unexported: value,
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct TaggedServer {
        pub name: String,
        pub postgres: Postgres,
    }

    record! {
        TaggedServer {
            name: value.required(),
            postgres: record::<Postgres>.flatten(),
        }
    }

    // -- Fixture for flatten-within-nested records ----------------------------

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct App {
        pub api: Api,
        pub service1: AppServer,
        pub service2: AppServer,
        pub mongo: Database,
    }

    record! {
        App {
            api: record::<Api>,
            service1: record::<AppServer>,
            service2: record::<AppServer>,
            mongo: record::<Database>,
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct AppServer {
        pub scheme: String,
        pub host: String,
        pub port: u16,
        pub username: String,
        pub password: String,
    }

    record! {
        AppServer {
            scheme: value.default("https"),
            host: value,
            port: value,
            username: value,
            password: value,
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Api {
        pub server: AppServer,
        pub test: bool,
    }

    record! {
        Api {
            server: record::<AppServer>.flatten(),
            test: value,
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Database {
        pub server: AppServer,
        pub db_name: String,
    }

    record! {
        Database {
            server: record::<AppServer>.flatten(),
            db_name: value,
        }
    }

    // -- Fixture for flatten collisions ---------------------------------------

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Shadowed {
        pub inner: AppServer,
        pub port: u16,
    }

    record! {
        Shadowed {
            inner: record::<AppServer>.flatten(),
            port: value,
        }
    }

    // -- Fixture for renames, skips and optional values -----------------------

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Tagged {
        pub access_key: String,
        pub db_name: String,
        pub cache: Vec<String>,
        pub timeout: Option<Duration>,
    }

    record! {
        Tagged {
            access_key: value.rename("accesskey"),
            db_name: value.default("configdb"),
            cache: value.skip(),
            timeout: value,
        }
    }

    // -- Fixtures for flat-key clashes ----------------------------------------

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Clash {
        pub postgres_port: i64,
        pub postgres: Postgres,
    }

    record! {
        Clash {
            postgres_port: value,
            postgres: record::<Postgres>,
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct HelpField {
        pub help: String,
    }

    record! {
        HelpField {
            help: value,
        }
    }

    // -- The smallest required-plus-default record -----------------------------

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Named {
        pub name: String,
        pub port: i64,
    }

    record! {
        Named {
            name: value.required(),
            port: value.default("6060"),
        }
    }

    pub const SERVER_TOML: &str = r#"
name = "koding"
enabled = true
id = 1234567890
labels = [123, 456]
users = ["ankara", "istanbul"]
interval = "10s"

[postgres]
enabled = true
port = 5432
hosts = ["192.168.2.1", "192.168.2.2", "192.168.2.3"]
availability_ratio = 8.23
"#;

    pub const SERVER_JSON: &str = r#"{
  "name": "koding",
  "enabled": true,
  "id": 1234567890,
  "labels": [123, 456],
  "users": ["ankara", "istanbul"],
  "interval": 10000000000,
  "postgres": {
    "enabled": true,
    "port": 5432,
    "hosts": ["192.168.2.1", "192.168.2.2", "192.168.2.3"],
    "db_name": null,
    "availability_ratio": 8.23
  }
}"#;

    pub const SERVER_YAML: &str = r#"
name: koding
enabled: true
id: 1234567890
labels: [123, 456]
users:
  - ankara
  - istanbul
interval: 10s
postgres:
  enabled: true
  port: 5432
  hosts: ["192.168.2.1", "192.168.2.2", "192.168.2.3"]
  availability_ratio: 8.23
"#;

    pub const APP_TOML: &str = r#"
[api]
host = "api.myapp.com"
port = 81

[service1]
host = "service1.myapp.com"
port = 82

[service2]
host = "service2.myapp.com"
port = 83

[mongo]
scheme = "mongodb"
host = "localhost"
port = 27017
username = "admin"
password = "admin"
db_name = "myDatabase"
"#;

    /// The environment equivalent of [`SERVER_TOML`].
    pub fn server_env() -> Vec<(String, String)> {
        [
            ("NAME", "koding"),
            ("ENABLED", "true"),
            ("ID", "1234567890"),
            ("LABELS", "123,456"),
            ("USERS", "ankara,istanbul"),
            ("INTERVAL", "10s"),
            ("POSTGRES_ENABLED", "true"),
            ("POSTGRES_PORT", "5432"),
            ("POSTGRES_HOSTS", "192.168.2.1,192.168.2.2,192.168.2.3"),
            ("POSTGRES_AVAILABILITY_RATIO", "8.23"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// What every loader should produce for the server fixtures.
    pub fn expected_server() -> Server {
        Server {
            name: "koding".into(),
            port: 6060,
            id: 1_234_567_890,
            labels: vec![123, 456],
            enabled: true,
            users: vec!["ankara".into(), "istanbul".into()],
            postgres: Postgres {
                enabled: true,
                port: 5432,
                hosts: vec![
                    "192.168.2.1".into(),
                    "192.168.2.2".into(),
                    "192.168.2.3".into(),
                ],
                db_name: "configdb".into(),
                availability_ratio: 8.23,
                _unexported: String::new(),
            },
            _unexported: String::new(),
            interval: Duration::from_secs(10),
        }
    }

    pub fn expected_app() -> App {
        let server = |scheme: &str, host: &str, port: u16| AppServer {
            scheme: scheme.into(),
            host: host.into(),
            port,
            ..AppServer::default()
        };
        App {
            api: Api {
                server: server("https", "api.myapp.com", 81),
                test: false,
            },
            service1: server("https", "service1.myapp.com", 82),
            service2: server("https", "service2.myapp.com", 83),
            mongo: Database {
                server: AppServer {
                    username: "admin".into(),
                    password: "admin".into(),
                    ..server("mongodb", "localhost", 27017)
                },
                db_name: "myDatabase".into(),
            },
        }
    }
}
