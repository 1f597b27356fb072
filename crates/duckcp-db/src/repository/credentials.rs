use diesel::prelude::*;

use crate::{
    models::{Credential, NewCredential},
    schema::credentials,
};

pub struct Credentials;

impl Credentials {
    /// Finds the credential of an app that is still valid at `now`.
    pub fn find_valid(
        conn: &mut SqliteConnection,
        platform_code: &str,
        app_code: &str,
        now: &str,
    ) -> QueryResult<Option<Credential>> {
        credentials::table
            .filter(credentials::platform_code.eq(platform_code))
            .filter(credentials::app_code.eq(app_code))
            .filter(credentials::expired_at.gt(now))
            .select(Credential::as_select())
            .first(conn)
            .optional()
    }

    /// Stores a credential, replacing any earlier one of the same app.
    pub fn replace(conn: &mut SqliteConnection, credential: &NewCredential) -> QueryResult<usize> {
        diesel::replace_into(credentials::table)
            .values(credential)
            .execute(conn)
    }
}
