//! User Account Repository

use super::{BaseRepository, CountRow, RepoError, RepoResult};
use crate::db::models::{Role, UserAccount, UserAccountCreate, UserAccountUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const TABLE: &str = "user_account";

#[derive(Clone)]
pub struct UserAccountRepository {
    base: BaseRepository,
}

impl UserAccountRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all accounts, optionally filtered by name/email/document substring
    pub async fn find_all(&self, q: Option<String>) -> RepoResult<Vec<UserAccount>> {
        let accounts: Vec<UserAccount> = match q {
            Some(text) => {
                self.base
                    .db()
                    .query(
                        "SELECT * FROM user_account WHERE string::lowercase(full_name) CONTAINS string::lowercase($q) \
                         OR string::lowercase(email) CONTAINS string::lowercase($q) \
                         OR document CONTAINS $q ORDER BY full_name",
                    )
                    .bind(("q", text))
                    .await?
                    .take(0)?
            }
            None => {
                self.base
                    .db()
                    .query("SELECT * FROM user_account ORDER BY full_name")
                    .await?
                    .take(0)?
            }
        };
        Ok(accounts)
    }

    /// Find account by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<UserAccount>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let account: Option<UserAccount> = self.base.db().select(thing).await?;
        Ok(account)
    }

    /// Find account by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<UserAccount>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user_account WHERE email = $email LIMIT 1")
            .bind(("email", email.trim().to_lowercase()))
            .await?;
        let accounts: Vec<UserAccount> = result.take(0)?;
        Ok(accounts.into_iter().next())
    }

    /// Find account by document number
    pub async fn find_by_document(&self, document: &str) -> RepoResult<Option<UserAccount>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user_account WHERE document = $document LIMIT 1")
            .bind(("document", document.trim().to_string()))
            .await?;
        let accounts: Vec<UserAccount> = result.take(0)?;
        Ok(accounts.into_iter().next())
    }

    /// Create a new account (password already validated by the caller)
    pub async fn create(&self, data: UserAccountCreate, registered_at: i64) -> RepoResult<UserAccount> {
        let document = data.document.trim().to_string();
        let email = data.email.trim().to_lowercase();

        if self.find_by_document(&document).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "An account with document '{}' already exists",
                document
            )));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "An account with email '{}' already exists",
                email
            )));
        }

        let hash_pass = UserAccount::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Password hashing failed: {}", e)))?;

        let account = UserAccount {
            id: None,
            document,
            full_name: data.full_name,
            email,
            phone: data.phone.unwrap_or_default(),
            hash_pass,
            role: data.role.unwrap_or(Role::Customer),
            is_active: true,
            registered_at,
        };

        let created: Option<UserAccount> = self.base.db().create(TABLE).content(account).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create account".to_string()))
    }

    /// Update an account
    pub async fn update(&self, id: &str, data: UserAccountUpdate) -> RepoResult<UserAccount> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Account {} not found", id)))?;

        let document = data
            .document
            .map(|d| d.trim().to_string())
            .unwrap_or(existing.document);
        let email = data
            .email
            .map(|e| e.trim().to_lowercase())
            .unwrap_or(existing.email);

        if let Some(found) = self.find_by_document(&document).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "An account with document '{}' already exists",
                document
            )));
        }
        if let Some(found) = self.find_by_email(&email).await?
            && found.id != existing.id
        {
            return Err(RepoError::Duplicate(format!(
                "An account with email '{}' already exists",
                email
            )));
        }

        let hash_pass = match data.password {
            Some(password) => UserAccount::hash_password(&password)
                .map_err(|e| RepoError::Database(format!("Password hashing failed: {}", e)))?,
            None => existing.hash_pass,
        };

        let full_name = data.full_name.unwrap_or(existing.full_name);
        let phone = data.phone.unwrap_or(existing.phone);
        let role = data.role.unwrap_or(existing.role);
        let is_active = data.is_active.unwrap_or(existing.is_active);

        self.base
            .db()
            .query("UPDATE $thing SET document = $document, full_name = $full_name, email = $email, phone = $phone, hash_pass = $hash_pass, role = $role, is_active = $is_active")
            .bind(("thing", thing))
            .bind(("document", document))
            .bind(("full_name", full_name))
            .bind(("email", email))
            .bind(("phone", phone))
            .bind(("hash_pass", hash_pass))
            .bind(("role", role))
            .bind(("is_active", is_active))
            .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Account {} not found", id)))
    }

    /// Hard delete an account
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    /// Count accounts holding a role
    pub async fn count_role(&self, role: Role) -> RepoResult<i64> {
        let row: Option<CountRow> = self
            .base
            .db()
            .query("SELECT count() AS count FROM user_account WHERE role = $role GROUP ALL")
            .bind(("role", role))
            .await?
            .take(0)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }
}
