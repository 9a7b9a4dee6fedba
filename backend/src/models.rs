use std::collections::BTreeMap;

use diesel::prelude::*;
use rocket::serde::{Deserialize, Serialize};

use crate::schema::{stations, votes};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = stations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Station {
    pub name: String,
    pub password: String,
    pub max_voters: i32,
    pub submitted: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = stations)]
pub struct NewStation<'a> {
    pub name: &'a str,
    pub password: &'a str,
    pub max_voters: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = votes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VoteTally {
    pub station: String,
    pub candidate: String,
    pub count: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = votes)]
pub struct NewVoteTally<'a> {
    pub station: &'a str,
    pub candidate: &'a str,
    pub count: i32,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ConfirmRequest {
    pub station: String,
    pub candidate: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SubmitRequest {
    pub station: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(crate = "rocket::serde")]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Ack { ok: true }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(crate = "rocket::serde")]
pub struct ErrorBody {
    pub error: String,
}

/// Candidate code to vote count.
pub type Totals = BTreeMap<String, i64>;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(crate = "rocket::serde")]
pub struct StationSummary {
    pub name: String,
    pub max_voters: i32,
    pub submitted: bool,
    pub votes: BTreeMap<String, i32>,
}
