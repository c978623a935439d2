use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response};

/// Surf middleware that logs every request at debug level.
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(
        &self,
        req: Request,
        client: Client,
        next: Next<'_>,
    ) -> surf::Result<Response> {
        let method = req.method();
        let url = req.url().clone();
        let start = Instant::now();

        let res = next.run(req, client).await?;

        log::debug!(
            "{} {} -> {} in {:?}",
            method,
            url,
            res.status(),
            start.elapsed()
        );
        Ok(res)
    }
}
