use diesel::prelude::*;

use crate::schema::credentials;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = credentials)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Credential {
    pub platform_code: String,
    pub app_code: String,
    pub access_token: String,
    pub expired_at: String,
}

#[derive(Insertable)]
#[diesel(table_name = credentials)]
pub struct NewCredential<'a> {
    pub platform_code: &'a str,
    pub app_code: &'a str,
    pub access_token: &'a str,
    pub expired_at: String,
}
