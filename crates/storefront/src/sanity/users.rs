//! User profile queries and the profile upsert.

use libaas_core::{Email, SubjectId, UserRef};

use super::{SanityClient, StoreError};
use crate::models::{ProfileUpdate, User};

impl SanityClient {
    /// Resolve the store document id for an identity-provider subject.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn lookup_user_ref(
        &self,
        subject: &SubjectId,
    ) -> Result<Option<UserRef>, StoreError> {
        const QUERY: &str = r#"*[_type == "user" && supabaseId == $subjectId][0]._id"#;

        self.query(QUERY, &[("subjectId", serde_json::json!(subject.as_str()))])
            .await
    }

    /// Fetch the full user document for a subject.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn user_by_subject(&self, subject: &SubjectId) -> Result<Option<User>, StoreError> {
        const QUERY: &str = r#"*[_type == "user" && supabaseId == $subjectId][0]{
            _id,
            supabaseId,
            email,
            fullName,
            phoneNumber,
            address
        }"#;

        self.query(QUERY, &[("subjectId", serde_json::json!(subject.as_str()))])
            .await
    }

    /// Update the user document for a subject, creating it first if absent.
    ///
    /// Only the editable profile fields are written; `supabaseId` and `email`
    /// are set at creation and never patched.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a query or mutation fails.
    pub async fn upsert_profile(
        &self,
        subject: &SubjectId,
        email: &Email,
        update: &ProfileUpdate,
    ) -> Result<(), StoreError> {
        let mutations = match self.lookup_user_ref(subject).await? {
            Some(existing) => serde_json::json!([{
                "patch": {
                    "id": existing.as_str(),
                    "set": {
                        "fullName": update.full_name,
                        "phoneNumber": update.phone_number,
                        "address": update.address
                    }
                }
            }]),
            None => serde_json::json!([{
                "create": {
                    "_type": "user",
                    "supabaseId": subject.as_str(),
                    "email": email.as_str(),
                    "fullName": update.full_name,
                    "phoneNumber": update.phone_number,
                    "address": update.address
                }
            }]),
        };

        self.mutate(mutations).await
    }
}
