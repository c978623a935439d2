use crate::error::Error;
use crate::options::RequestOptions;
use crate::ApiClient;
use serde::de::DeserializeOwned;
use serde_json::Value;
use surf::http::Method;

/// Two-phase optimistic update.
///
/// `apply` runs before the request is issued so the caller's local state can
/// reflect the change immediately; `rollback` runs exactly once if the
/// request fails or is cancelled, and never on success.
pub struct OptimisticUpdate<A, R>
where
    A: FnOnce(),
    R: FnOnce(),
{
    pub apply: A,
    pub rollback: R,
}

impl ApiClient {
    /// Issue a mutation with an optimistic local update.
    pub async fn mutate<T, A, R>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
        update: OptimisticUpdate<A, R>,
    ) -> Result<Option<T>, Error>
    where
        T: DeserializeOwned,
        A: FnOnce(),
        R: FnOnce(),
    {
        (update.apply)();

        match self.request(method, path, body, options).await {
            Ok(Some(value)) => match crate::decode(value) {
                Ok(decoded) => Ok(Some(decoded)),
                Err(err) => {
                    (update.rollback)();
                    Err(err)
                }
            },
            // Cancelled: the change never reached the backend, so the
            // optimistic state must be undone as well.
            Ok(None) => {
                (update.rollback)();
                Ok(None)
            }
            Err(err) => {
                (update.rollback)();
                Err(err)
            }
        }
    }
}
