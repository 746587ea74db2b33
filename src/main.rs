use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use sea_query::PostgresQueryBuilder;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use filter_compiler::{
    CompilerConfig, Criteria, EntityDef, FieldDef, FieldKind, FieldTag, FilterData, FindData,
    JoinDeclaration, MemoryStore, Record, Sort, SqlCompiler, TypedValue,
};

const CONFIG_FILE: &str = "filter_compiler.json";

const LEVELS: &[&str] = &["JUNIOR", "SENIOR", "LEAD"];

static TEAM: EntityDef = EntityDef {
    name: "Team",
    parent: None,
    fields: &[
        FieldDef::new("id", FieldKind::Int),
        FieldDef::new("name", FieldKind::String),
    ],
};

static EMPLOYEE: EntityDef = EntityDef {
    name: "Employee",
    parent: None,
    fields: &[
        FieldDef::new("id", FieldKind::Int),
        FieldDef::new("name", FieldKind::String),
        FieldDef::new("age", FieldKind::Int),
        FieldDef::new("level", FieldKind::Enum(LEVELS)),
        FieldDef::new("team_id", FieldKind::Int),
        FieldDef::new("password", FieldKind::String).tagged(&[FieldTag::Ignored]),
    ],
};

#[derive(Debug, Clone)]
struct Team {
    id: i64,
    name: String,
}

impl Record for Team {
    fn entity() -> &'static EntityDef {
        &TEAM
    }

    fn field_value(&self, field: &str) -> TypedValue {
        match field {
            "id" => TypedValue::Int(self.id),
            "name" => TypedValue::String(self.name.clone()),
            _ => TypedValue::Null,
        }
    }
}

#[derive(Debug, Clone)]
struct Employee {
    id: i64,
    name: String,
    age: i64,
    level: &'static str,
    team: Option<Team>,
}

impl Record for Employee {
    fn entity() -> &'static EntityDef {
        &EMPLOYEE
    }

    fn field_value(&self, field: &str) -> TypedValue {
        match field {
            "id" => TypedValue::Int(self.id),
            "name" => TypedValue::String(self.name.clone()),
            "age" => TypedValue::Int(self.age),
            "level" => TypedValue::Enum(self.level),
            "team_id" => self
                .team
                .as_ref()
                .map_or(TypedValue::Null, |team| TypedValue::Int(team.id)),
            _ => TypedValue::Null,
        }
    }

    fn joined(&self, alias: &str) -> Option<&dyn Record> {
        match alias {
            "team" => self.team.as_ref().map(|team| team as &dyn Record),
            _ => None,
        }
    }
}

fn team(id: i64, name: &str) -> Team {
    Team {
        id,
        name: name.to_string(),
    }
}

fn employee(id: i64, name: &str, age: i64, level: &'static str, team: Option<&Team>) -> Employee {
    Employee {
        id,
        name: name.to_string(),
        age,
        level,
        team: team.cloned(),
    }
}

fn sample_store() -> MemoryStore<Employee> {
    let platform = team(1, "Platform");
    let billing = team(2, "Billing");
    MemoryStore::new(vec![
        employee(1, "Ann", 30, "SENIOR", Some(&platform)),
        employee(2, "Bob", 17, "JUNIOR", Some(&billing)),
        employee(3, "Cid", 45, "LEAD", Some(&platform)),
        employee(4, "Dee", 24, "JUNIOR", None),
    ])
}

/// Load the config file, falling back to defaults when it is absent or invalid
fn load_config() -> CompilerConfig {
    match CompilerConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            info!(file = CONFIG_FILE, tables = config.table_mapping.len(), "loaded config");
            config
        }
        Err(e) => {
            warn!(error = %e, "using default config");
            CompilerConfig::default()
        }
    }
}

/// Compile one filter document against `Employee` and print every rendering of it
fn run(
    json: &str,
    config: &CompilerConfig,
    sql: &SqlCompiler,
    store: &MemoryStore<Employee>,
) -> Result<()> {
    let find = FindData::new(&EMPLOYEE)
        .with_config(config)
        .join(JoinDeclaration::new("team", &TEAM).on("id", "team_id"))
        .filter_json(json)
        .sort(Sort::asc("age"));

    let spec = find.specification()?;
    let select = sql.compile_select(&spec, find.request().page)?;
    println!("\n[SQL]:\n{}", select.to_string(PostgresQueryBuilder));

    let text = find.to_text_query()?;
    println!("\n[Text query]:\n{}", text.select);
    for (i, param) in text.params.iter().enumerate() {
        println!("  ?{} = {:?}", i + 1, param);
    }

    let page = find.to_page(store)?;
    println!("\n[Matches]: {} of {}", page.content.len(), page.total_elements);
    for employee in &page.content {
        println!("  {} ({}, {})", employee.name, employee.age, employee.level);
    }

    let rows = find.pickup(store, &["name", "team.name"])?;
    println!("\n[Pickup name, team.name]:");
    for row in rows {
        println!("  {:?}", row);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("--- Filter compiler ---");
    let config = load_config();
    let sql = SqlCompiler::from_config(&config);
    let store = sample_store();

    let example = FilterData::all([
        FilterData::leaf("age", Criteria::Gte, "18"),
        FilterData::leaf("team.name", Criteria::Eq, "Platform"),
    ]);
    let example = example.to_json().unwrap_or_default();
    println!("\n[Example filter]:\n{}", example);
    if let Err(e) = run(&example, &config, &sql, &store) {
        println!("✗ {}", e);
    }

    println!("\nEnter a filter document per line, Ctrl-D to quit.");
    let mut editor = DefaultEditor::new()?;
    loop {
        match editor.readline("filter> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);
                if let Err(e) = run(line, &config, &sql, &store) {
                    println!("✗ {}", e);
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
