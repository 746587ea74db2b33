//! Entities and records shared by the unit tests.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::schema::{EntityDef, FieldDef, FieldKind, FieldTag, Record};
use crate::value::TypedValue;

pub const STATUS_VARIANTS: &[&str] = &["ACTIVE", "SUSPENDED"];

pub static AUDITABLE: EntityDef = EntityDef {
    name: "Auditable",
    parent: None,
    fields: &[FieldDef::new("audit_trail", FieldKind::String)],
};

pub static BASE_ENTITY: EntityDef = EntityDef {
    name: "BaseEntity",
    parent: Some(&AUDITABLE),
    fields: &[
        FieldDef::new("id", FieldKind::Int),
        FieldDef::new("created_at", FieldKind::DateTime),
    ],
};

pub static PERSON: EntityDef = EntityDef {
    name: "Person",
    parent: Some(&BASE_ENTITY),
    fields: &[
        FieldDef::new("name", FieldKind::String),
        FieldDef::new("age", FieldKind::Int),
        FieldDef::new("score", FieldKind::Double),
        FieldDef::new("active", FieldKind::Bool),
        FieldDef::new("birth_date", FieldKind::Date),
        FieldDef::new("shift_start", FieldKind::Time),
        FieldDef::new("status", FieldKind::Enum(STATUS_VARIANTS)),
        FieldDef::new("dept_id", FieldKind::Int),
        FieldDef::new("password", FieldKind::String).tagged(&[FieldTag::Ignored]),
        FieldDef::new("cached_rank", FieldKind::Int).tagged(&[FieldTag::Transient]),
        FieldDef::new("tasks", FieldKind::Other).tagged(&[FieldTag::OneToMany]),
    ],
};

pub static DEPARTMENT: EntityDef = EntityDef {
    name: "Department",
    parent: None,
    fields: &[
        FieldDef::new("id", FieldKind::Int),
        FieldDef::new("name", FieldKind::String),
        FieldDef::new("budget", FieldKind::Double),
    ],
};

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub budget: f64,
}

impl Record for Department {
    fn entity() -> &'static EntityDef {
        &DEPARTMENT
    }

    fn field_value(&self, field: &str) -> TypedValue {
        match field {
            "id" => TypedValue::Int(self.id),
            "name" => TypedValue::String(self.name.clone()),
            "budget" => TypedValue::Double(self.budget),
            _ => TypedValue::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i64,
    pub created_at: NaiveDateTime,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub score: f64,
    pub active: bool,
    pub birth_date: Option<NaiveDate>,
    pub shift_start: NaiveTime,
    pub status: &'static str,
    pub dept: Option<Department>,
}

impl Record for Person {
    fn entity() -> &'static EntityDef {
        &PERSON
    }

    fn field_value(&self, field: &str) -> TypedValue {
        match field {
            "id" => TypedValue::Int(self.id),
            "created_at" => TypedValue::DateTime(self.created_at),
            "name" => self.name.clone().map_or(TypedValue::Null, TypedValue::String),
            "age" => self.age.map_or(TypedValue::Null, TypedValue::Int),
            "score" => TypedValue::Double(self.score),
            "active" => TypedValue::Bool(self.active),
            "birth_date" => self.birth_date.map_or(TypedValue::Null, TypedValue::Date),
            "shift_start" => TypedValue::Time(self.shift_start),
            "status" => TypedValue::Enum(self.status),
            "dept_id" => self
                .dept
                .as_ref()
                .map_or(TypedValue::Null, |dept| TypedValue::Int(dept.id)),
            _ => TypedValue::Null,
        }
    }

    fn joined(&self, alias: &str) -> Option<&dyn Record> {
        match alias {
            "dept" => self.dept.as_ref().map(|dept| dept as &dyn Record),
            _ => None,
        }
    }
}

pub fn person(id: i64, name: &str, age: i64) -> Person {
    Person {
        id,
        created_at: NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
        name: Some(name.to_string()),
        age: Some(age),
        score: age as f64 / 10.0,
        active: true,
        birth_date: NaiveDate::from_ymd_opt(2024 - age as i32, 6, 15),
        shift_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        status: "ACTIVE",
        dept: None,
    }
}

pub fn department(id: i64, name: &str) -> Department {
    Department {
        id,
        name: name.to_string(),
        budget: 1000.0 * id as f64,
    }
}

/// `Ann` (30) and `Bob` (17)
pub fn ann_and_bob() -> Vec<Person> {
    vec![person(1, "Ann", 30), person(2, "Bob", 17)]
}
