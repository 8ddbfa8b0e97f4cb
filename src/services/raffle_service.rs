use crate::api::endpoint;
use crate::availability::Availability;
use crate::error::AppResult;
use crate::models::{
    NewRaffle, ParticipationRequest, ParticipationResponse, Raffle, RaffleStatus,
    RaffleStatusDetail, UserNotification, WinnerSummary,
};
use crate::session::SessionContext;
use serde_json::json;
use tracing::{debug, info, warn};

const LIST_KEY: &str = "sorteos";

fn detail_key(id: &str) -> String {
    format!("sorteos/{}", id)
}

/// Typed access to the `/sorteos` endpoints for one session
pub struct RaffleService<'a> {
    session: &'a SessionContext,
}

impl<'a> RaffleService<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    /// List all raffles (cached)
    pub async fn list(&self) -> AppResult<Vec<Raffle>> {
        let cache = self.session.cache();
        if let Some(raffles) = cache.get::<Vec<Raffle>>(LIST_KEY).await {
            return Ok(raffles);
        }

        let raffles: Vec<Raffle> = self.session.api().get("/sorteos").await.into_result()?;
        for raffle in &raffles {
            if let Err(e) = raffle.validate() {
                warn!("Backend returned inconsistent raffle: {}", e);
            }
        }
        info!("Fetched {} raffles", raffles.len());

        cache.set(LIST_KEY, &raffles).await;
        Ok(raffles)
    }

    /// Get a raffle by id (cached)
    pub async fn get(&self, id: &str) -> AppResult<Raffle> {
        if let Some(raffle) = self.session.cache().get::<Raffle>(&detail_key(id)).await {
            return Ok(raffle);
        }
        self.refresh(id).await
    }

    /// Get a raffle by id, bypassing the cache
    pub async fn refresh(&self, id: &str) -> AppResult<Raffle> {
        let raffle: Raffle = self
            .session
            .api()
            .get(&endpoint(&["sorteos", id], &[])?)
            .await
            .into_result()?;

        if let Err(e) = raffle.validate() {
            warn!("Backend returned inconsistent raffle: {}", e);
        }

        self.session.cache().set(&detail_key(id), &raffle).await;
        Ok(raffle)
    }

    /// Detailed sale status
    pub async fn status(&self, id: &str) -> AppResult<RaffleStatusDetail> {
        self.session
            .api()
            .get(&endpoint(&["sorteos", id, "estado"], &[])?)
            .await
            .into_result()
    }

    /// Winning number with masked proof reference
    pub async fn winner(&self, id: &str) -> AppResult<WinnerSummary> {
        self.session
            .api()
            .get(&endpoint(&["sorteos", id, "ganador"], &[])?)
            .await
            .into_result()
    }

    /// Raffles a user took part in
    pub async fn notifications(&self, user_id: &str) -> AppResult<Vec<UserNotification>> {
        self.session
            .api()
            .get(&endpoint(&["sorteos", "notificaciones", user_id], &[])?)
            .await
            .into_result()
    }

    /// Fresh availability split for a raffle
    pub async fn available_numbers(&self, id: &str) -> AppResult<Availability> {
        let raffle = self.refresh(id).await?;
        Ok(raffle.availability())
    }

    /// Register a participation with the backend
    pub async fn participate(
        &self,
        request: &ParticipationRequest,
    ) -> AppResult<ParticipationResponse> {
        let response: ParticipationResponse = self
            .session
            .api()
            .post("/sorteos/participar", request)
            .await
            .into_result()?;

        info!(
            "Participation in raffle {} confirmed: numbers {:?}",
            request.raffle_id, response.assigned_numbers
        );
        self.invalidate(&request.raffle_id).await;
        Ok(response)
    }

    /// Create a raffle (admin only)
    pub async fn create(&self, raffle: &NewRaffle) -> AppResult<Raffle> {
        self.session.require_admin()?;
        raffle.validate()?;

        let created: Raffle = self
            .session
            .api()
            .post("/sorteos/crear", raffle)
            .await
            .into_result()?;

        info!("Raffle {} created", created.id);
        self.session.cache().clear(LIST_KEY).await;
        Ok(created)
    }

    /// Request a lifecycle transition (admin only); returns the server's view
    pub async fn update_status(&self, id: &str, status: RaffleStatus) -> AppResult<Raffle> {
        self.session.require_admin()?;

        let body = json!({ "configuracion": { "estado": status } });
        let updated: Raffle = self
            .session
            .api()
            .patch(&endpoint(&["sorteos", id], &[])?, &body)
            .await
            .into_result()?;

        if updated.status() != status {
            warn!(
                "Raffle {} requested {} but server reports {}",
                id,
                status.as_str(),
                updated.status().as_str()
            );
        } else {
            info!("Raffle {} is now {}", id, status.as_str());
        }

        self.invalidate(id).await;
        Ok(updated)
    }

    /// Delete a raffle (admin only)
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.session.require_admin()?;

        self.session
            .api()
            .delete::<serde_json::Value>(&endpoint(&["sorteos", id], &[])?)
            .await
            .into_result()?;

        info!("Raffle {} deleted", id);
        self.invalidate(id).await;
        Ok(())
    }

    async fn invalidate(&self, id: &str) {
        // The list prefix also covers every detail entry
        self.session.cache().clear(LIST_KEY).await;
        debug!("Cache invalidated after change to raffle {}", id);
    }
}
