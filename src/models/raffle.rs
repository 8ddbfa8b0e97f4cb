use crate::availability::{self, Availability};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Raffle lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaffleStatus {
    #[serde(rename = "BORRADOR")]
    Draft,
    #[serde(rename = "ACTIVO")]
    Active,
    #[serde(rename = "PAUSADO")]
    Paused,
    #[serde(rename = "FINALIZADO")]
    Finished,
    #[serde(rename = "CANCELADO")]
    Cancelled,
}

impl RaffleStatus {
    /// Parse from the backend's wire string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_uppercase().as_str() {
            "BORRADOR" => Ok(RaffleStatus::Draft),
            "ACTIVO" => Ok(RaffleStatus::Active),
            "PAUSADO" => Ok(RaffleStatus::Paused),
            "FINALIZADO" => Ok(RaffleStatus::Finished),
            "CANCELADO" => Ok(RaffleStatus::Cancelled),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to the backend's wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            RaffleStatus::Draft => "BORRADOR",
            RaffleStatus::Active => "ACTIVO",
            RaffleStatus::Paused => "PAUSADO",
            RaffleStatus::Finished => "FINALIZADO",
            RaffleStatus::Cancelled => "CANCELADO",
        }
    }

    /// Only active raffles accept purchases
    pub fn is_open_for_sale(&self) -> bool {
        *self == RaffleStatus::Active
    }

    /// Finished and cancelled raffles never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, RaffleStatus::Finished | RaffleStatus::Cancelled)
    }
}

impl From<RaffleStatus> for String {
    fn from(status: RaffleStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Raffle kind, mirrors the prize variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RaffleKind {
    Token,
    Material,
}

/// Prize awarded to the winning number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum Prize {
    #[serde(rename = "TOKEN")]
    Token {
        token: String,
        #[serde(rename = "cantidad", with = "rust_decimal::serde::float")]
        amount: Decimal,
    },
    #[serde(rename = "MATERIAL")]
    Material {
        #[serde(rename = "descripcion")]
        description: String,
        #[serde(rename = "valor", with = "rust_decimal::serde::float")]
        value: Decimal,
        #[serde(rename = "moneda")]
        currency: String,
    },
}

impl Prize {
    /// Short human-readable summary, e.g. `"100 WLD"`
    pub fn summary(&self) -> String {
        match self {
            Prize::Token { token, amount } => format!("{} {}", amount.normalize(), token),
            Prize::Material { description, value, currency } => {
                format!("{} ({} {})", description, value.normalize(), currency)
            }
        }
    }
}

/// Sale configuration of a raffle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaffleConfig {
    #[serde(rename = "estado")]
    pub status: RaffleStatus,
    #[serde(rename = "fecha_inicio", default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_fin", default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "total_numeros")]
    pub total_numbers: u32,
    #[serde(rename = "precio_por_numero", with = "rust_decimal::serde::float")]
    pub price_per_number: Decimal,
    #[serde(rename = "imagen_url", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Winning entry as stored on the raffle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winner {
    #[serde(rename = "numero")]
    pub number: u32,
    pub nullifier_hash: String,
}

/// Winning entry with the proof reference masked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerSummary {
    #[serde(rename = "numero")]
    pub number: u32,
    pub nullifier_hash_masked: String,
}

/// Raffle model as returned by `/sorteos` and `/sorteos/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raffle {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    #[serde(rename = "tipo")]
    pub kind: RaffleKind,
    #[serde(rename = "premio")]
    pub prize: Prize,
    #[serde(rename = "configuracion")]
    pub config: RaffleConfig,
    #[serde(rename = "numeros_vendidos", default)]
    pub sold_numbers: Vec<u32>,
    #[serde(rename = "creado_por", default)]
    pub created_by: Option<String>,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_actualizacion", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "premio_acumulado",
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub carryover: Option<Decimal>,
    #[serde(rename = "ganador", default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Winner>,
}

impl Raffle {
    /// Get status as an enum
    pub fn status(&self) -> RaffleStatus {
        self.config.status
    }

    /// Check if raffle is accepting purchases
    pub fn is_active(&self) -> bool {
        self.status().is_open_for_sale()
    }

    /// Number of units still for sale
    pub fn remaining(&self) -> u32 {
        self.availability().available.len() as u32
    }

    /// Split the number pool into available and sold
    pub fn availability(&self) -> Availability {
        availability::derive(self.config.total_numbers, &self.sold_numbers)
    }

    /// Price of `quantity` units
    pub fn total_cost(&self, quantity: usize) -> Decimal {
        self.config.price_per_number * Decimal::from(quantity as u64)
    }

    /// Check the sold-numbers invariant: at most `total` unique entries in [1, total]
    pub fn validate(&self) -> AppResult<()> {
        let total = self.config.total_numbers;

        if self.sold_numbers.len() > total as usize {
            return Err(AppError::Validation(format!(
                "Raffle {} has {} sold numbers but only {} in total",
                self.id,
                self.sold_numbers.len(),
                total
            )));
        }

        let mut seen = HashSet::with_capacity(self.sold_numbers.len());
        for &number in &self.sold_numbers {
            if number == 0 || number > total {
                return Err(AppError::Validation(format!(
                    "Raffle {} sold number {} is outside 1..={}",
                    self.id, number, total
                )));
            }
            if !seen.insert(number) {
                return Err(AppError::Validation(format!(
                    "Raffle {} sold number {} appears twice",
                    self.id, number
                )));
            }
        }

        Ok(())
    }
}

/// Payload for `POST /sorteos/crear`
#[derive(Debug, Clone, Serialize)]
pub struct NewRaffle {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "tipo")]
    pub kind: RaffleKind,
    #[serde(rename = "premio")]
    pub prize: Prize,
    #[serde(rename = "configuracion")]
    pub config: RaffleConfig,
}

impl NewRaffle {
    /// Check that the raffle can be offered for sale
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Raffle name is required".to_string()));
        }
        if self.config.total_numbers == 0 {
            return Err(AppError::Validation(
                "Raffle must offer at least one number".to_string(),
            ));
        }
        if self.config.price_per_number <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Price per number must be positive".to_string(),
            ));
        }
        let kind_matches = matches!(
            (&self.kind, &self.prize),
            (RaffleKind::Token, Prize::Token { .. }) | (RaffleKind::Material, Prize::Material { .. })
        );
        if !kind_matches {
            return Err(AppError::Validation(
                "Raffle kind does not match prize".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response of `GET /sorteos/{id}/estado`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleStatusDetail {
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "fechaFin", default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "numerosVendidos")]
    pub sold_count: u32,
    #[serde(rename = "totalNumeros")]
    pub total_count: u32,
    #[serde(rename = "porcentajeVendido")]
    pub percent_sold: f64,
    #[serde(rename = "premio")]
    pub prize: Prize,
    #[serde(
        rename = "premioAcumulado",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub carryover: Option<Decimal>,
    #[serde(rename = "ganador", default)]
    pub winner: Option<WinnerSummary>,
}

impl RaffleStatusDetail {
    /// Parsed status, `None` if the backend sent an unknown value
    pub fn status_enum(&self) -> Option<RaffleStatus> {
        RaffleStatus::from_str(&self.status).ok()
    }
}

/// Entry of `GET /sorteos/notificaciones/{userId}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNotification {
    #[serde(rename = "raffleId")]
    pub raffle_id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "numerosComprados", default)]
    pub purchased_numbers: Vec<u32>,
    #[serde(rename = "esGanador", default)]
    pub is_winner: bool,
    #[serde(rename = "fechaFin", default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(rename = "premio")]
    pub prize: Prize,
    #[serde(
        rename = "premioAcumulado",
        default,
        with = "rust_decimal::serde::float_option"
    )]
    pub carryover: Option<Decimal>,
}
