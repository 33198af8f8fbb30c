//! In-memory stand-in for the raffle service
//!
//! Same paths, envelopes, status codes and error bodies as the real service,
//! served on an ephemeral port from its own thread and runtime.

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;
use std::thread;

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use base64::Engine;
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use serde_json::{json, Value};
use tokio::runtime::Builder;
use tokio::sync::oneshot;

use raffle_harness::model::{
    Donation, DonationRequest, Participant, ParticipantRequest, PlayParticipant, Prize,
    PrizePlayResult, PrizeRequest, Raffle, RaffleRequest, ResponseId,
};

const ORGANIZER_HEADER: &str = "x-goog-authenticated-user-id";

const ALLOWED_CHARS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_{}[]:;<>,.?~\
абвгґдеєжзиіїйклмнопрстуфхцчшщьюяАБВГҐДЕЄЖЗИІЇЙКЛМНОПРСТУФХЦЧШЩЬЮЯ";

#[derive(Default)]
struct Store {
    raffles: Vec<RaffleEntry>,
}

struct RaffleEntry {
    raffle: Raffle,
    participants: Vec<Participant>,
    prizes: Vec<PrizeEntry>,
}

struct PrizeEntry {
    prize: Prize,
    donations: Vec<Donation>,
}

impl Store {
    fn raffle(&mut self, id: &str, op: &'static str) -> Result<&mut RaffleEntry, StubError> {
        self.raffles
            .iter_mut()
            .find(|r| r.raffle.id == id)
            .ok_or(StubError::NotFound(op))
    }
}

impl RaffleEntry {
    fn prize(&mut self, id: &str, op: &'static str) -> Result<&mut PrizeEntry, StubError> {
        self.prizes
            .iter_mut()
            .find(|p| p.prize.id == id)
            .ok_or(StubError::NotFound(op))
    }
}

type SharedStore = Arc<Mutex<Store>>;

enum StubError {
    Validation {
        op: &'static str,
        request: &'static str,
        failures: Vec<(&'static str, &'static str)>,
    },
    NotFound(&'static str),
    Unauthorized,
    NoParticipants,
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            StubError::Validation { op, request, failures } => {
                let lines: Vec<String> = failures
                    .iter()
                    .map(|(field, rule)| {
                        format!(
                            "Key: '{request}.{field}' Error:Field validation for '{field}' \
                             failed on the '{rule}' tag"
                        )
                    })
                    .collect();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{op}: validate: {}\n", lines.join("\n")),
                )
            }
            StubError::NotFound(op) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{op}: item not found\n"),
            ),
            StubError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "missing organizer\n".to_string())
            }
            StubError::NoParticipants => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "play prize: no participants\n".to_string(),
            ),
        };
        (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
    }
}

fn allowed(value: &str) -> bool {
    value.chars().all(|c| ALLOWED_CHARS.contains(c))
}

fn valid_phone(value: &str) -> bool {
    value
        .strip_prefix("+380")
        .map_or(false, |rest| {
            (9..=10).contains(&rest.len()) && rest.chars().all(|c| c.is_ascii_digit())
        })
}

fn reject(
    op: &'static str,
    request: &'static str,
    failures: Vec<(&'static str, &'static str)>,
) -> Result<(), StubError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(StubError::Validation { op, request, failures })
    }
}

fn validate_raffle(op: &'static str, req: &RaffleRequest) -> Result<(), StubError> {
    let mut failures = Vec::new();
    if req.name.chars().count() < 3 {
        failures.push(("Name", "required"));
    } else if !allowed(&req.name) {
        failures.push(("Name", "charsValidation"));
    }
    if !allowed(&req.note) {
        failures.push(("Note", "charsValidation"));
    }
    reject(op, "RaffleRequest", failures)
}

fn validate_participant(op: &'static str, req: &ParticipantRequest) -> Result<(), StubError> {
    let mut failures = Vec::new();
    if !allowed(&req.name) {
        failures.push(("Name", "charsValidation"));
    }
    if req.phone.is_empty() {
        failures.push(("Phone", "required"));
    } else if !valid_phone(&req.phone) {
        failures.push(("Phone", "phoneValidation"));
    }
    if !allowed(&req.note) {
        failures.push(("Note", "charsValidation"));
    }
    reject(op, "ParticipantRequest", failures)
}

fn validate_prize(op: &'static str, req: &PrizeRequest) -> Result<(), StubError> {
    let mut failures = Vec::new();
    if req.name.is_empty() {
        failures.push(("Name", "required"));
    } else if !allowed(&req.name) {
        failures.push(("Name", "charsValidation"));
    }
    if req.ticket_cost == 0 {
        failures.push(("TicketCost", "required"));
    }
    if !allowed(&req.description) {
        failures.push(("Description", "charsValidation"));
    }
    reject(op, "PrizeRequest", failures)
}

fn validate_donation(op: &'static str, req: &DonationRequest) -> Result<(), StubError> {
    let mut failures = Vec::new();
    if req.amount == 0 {
        failures.push(("Amount", "required"));
    }
    if req.participant_id.is_empty() {
        failures.push(("ParticipantID", "required"));
    }
    reject(op, "DonationRequest", failures)
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn tickets(amount: i64, cost: i64) -> i64 {
    if cost <= 0 {
        0
    } else {
        amount / cost
    }
}

fn items<T: serde::Serialize>(items: &[T]) -> Json<Value> {
    // The real service encodes an empty slice as null
    if items.is_empty() {
        Json(json!({ "items": null }))
    } else {
        Json(json!({ "items": items }))
    }
}

async fn require_organizer(request: Request, next: Next) -> Response {
    let present = request
        .headers()
        .get(ORGANIZER_HEADER)
        .map_or(false, |v| !v.is_empty());
    if !present {
        return StubError::Unauthorized.into_response();
    }
    next.run(request).await
}

// Raffles

async fn list_raffles(State(store): State<SharedStore>) -> Json<Value> {
    let store = store.lock();
    let raffles: Vec<&Raffle> = store.raffles.iter().map(|r| &r.raffle).collect();
    items(&raffles)
}

async fn create_raffle(
    State(store): State<SharedStore>,
    Json(req): Json<RaffleRequest>,
) -> Result<Json<ResponseId>, StubError> {
    validate_raffle("create raffle", &req)?;
    let id = new_id();
    store.lock().raffles.push(RaffleEntry {
        raffle: Raffle {
            id: id.clone(),
            name: req.name,
            note: req.note,
            organizer_id: Some("dummy_test_user".into()),
            created_at: Some(Utc::now()),
        },
        participants: Vec::new(),
        prizes: Vec::new(),
    });
    Ok(Json(ResponseId { id }))
}

async fn update_raffle(
    State(store): State<SharedStore>,
    Path(raffle_id): Path<String>,
    Json(req): Json<RaffleRequest>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;
    validate_raffle("update raffle", &req)?;
    entry.raffle.name = req.name;
    entry.raffle.note = req.note;
    Ok(Json(json!({})))
}

async fn delete_raffle(
    State(store): State<SharedStore>,
    Path(raffle_id): Path<String>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    store.raffle(&raffle_id, "deleting raffle")?;
    store.raffles.retain(|r| r.raffle.id != raffle_id);
    Ok(Json(json!({})))
}

async fn download_raffle(
    State(store): State<SharedStore>,
    Path(raffle_id): Path<String>,
) -> Result<Response, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;

    let mut sheet = format!("raffle\t{}\t{}\n", entry.raffle.name, entry.raffle.note);
    for p in &entry.participants {
        sheet.push_str(&format!("participant\t{}\t{}\n", p.name, p.phone));
    }
    for prize in &entry.prizes {
        sheet.push_str(&format!("prize\t{}\t{}\n", prize.prize.name, prize.prize.ticket_cost));
        for d in &prize.donations {
            sheet.push_str(&format!("donation\t{}\t{}\n", d.participant_id, d.amount));
        }
    }
    let encoded = base64::engine::general_purpose::STANDARD.encode(sheet.as_bytes());
    let disposition = format!("attachment; filename=raffle-{raffle_id}.xlsx");

    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(encoded)).into_response())
}

// Participants

async fn list_participants(
    State(store): State<SharedStore>,
    Path(raffle_id): Path<String>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;
    Ok(items(&entry.participants))
}

async fn create_participant(
    State(store): State<SharedStore>,
    Path(raffle_id): Path<String>,
    Json(req): Json<ParticipantRequest>,
) -> Result<Json<ResponseId>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;
    validate_participant("create participant", &req)?;
    let id = new_id();
    entry.participants.push(Participant {
        id: id.clone(),
        name: req.name,
        phone: req.phone,
        note: req.note,
        created_at: Some(Utc::now()),
    });
    Ok(Json(ResponseId { id }))
}

async fn update_participant(
    State(store): State<SharedStore>,
    Path((raffle_id, participant_id)): Path<(String, String)>,
    Json(req): Json<ParticipantRequest>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get participant")?;
    let participant = entry
        .participants
        .iter_mut()
        .find(|p| p.id == participant_id)
        .ok_or(StubError::NotFound("get participant"))?;
    validate_participant("update participant", &req)?;
    participant.name = req.name;
    participant.phone = req.phone;
    participant.note = req.note;
    Ok(Json(json!({})))
}

async fn delete_participant(
    State(store): State<SharedStore>,
    Path((raffle_id, participant_id)): Path<(String, String)>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "deleting participant")?;
    let before = entry.participants.len();
    entry.participants.retain(|p| p.id != participant_id);
    if entry.participants.len() == before {
        return Err(StubError::NotFound("deleting participant"));
    }
    Ok(Json(json!({})))
}

// Prizes

async fn list_prizes(
    State(store): State<SharedStore>,
    Path(raffle_id): Path<String>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;
    let prizes: Vec<&Prize> = entry.prizes.iter().map(|p| &p.prize).collect();
    Ok(items(&prizes))
}

async fn create_prize(
    State(store): State<SharedStore>,
    Path(raffle_id): Path<String>,
    Json(req): Json<PrizeRequest>,
) -> Result<Json<ResponseId>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;
    validate_prize("create prize", &req)?;
    let id = new_id();
    entry.prizes.push(PrizeEntry {
        prize: Prize {
            id: id.clone(),
            name: req.name,
            ticket_cost: req.ticket_cost,
            description: req.description,
            created_at: Some(Utc::now()),
        },
        donations: Vec::new(),
    });
    Ok(Json(ResponseId { id }))
}

async fn get_prize(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id)): Path<(String, String)>,
) -> Result<Json<Prize>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get prize")?;
    Ok(Json(entry.prize(&prize_id, "get prize")?.prize.clone()))
}

async fn update_prize(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id)): Path<(String, String)>,
    Json(req): Json<PrizeRequest>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get prize")?;
    let prize = entry.prize(&prize_id, "get prize")?;
    validate_prize("update prize", &req)?;
    prize.prize.name = req.name;
    prize.prize.ticket_cost = req.ticket_cost;
    prize.prize.description = req.description;
    for d in &mut prize.donations {
        d.tickets_number = tickets(d.amount, req.ticket_cost);
    }
    Ok(Json(json!({})))
}

async fn delete_prize(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id)): Path<(String, String)>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "deleting prize")?;
    entry.prize(&prize_id, "deleting prize")?;
    entry.prizes.retain(|p| p.prize.id != prize_id);
    Ok(Json(json!({})))
}

async fn play_prize(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id)): Path<(String, String)>,
) -> Result<Json<PrizePlayResult>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get prize to play")?;
    let participants = entry.participants.clone();
    let prize = entry.prize(&prize_id, "get prize to play")?;

    let mut players: Vec<PlayParticipant> = participants
        .into_iter()
        .filter_map(|participant| {
            let donations: Vec<Donation> = prize
                .donations
                .iter()
                .filter(|d| d.participant_id == participant.id)
                .cloned()
                .collect();
            if donations.is_empty() {
                return None;
            }
            Some(PlayParticipant {
                total_donation: donations.iter().map(|d| d.amount).sum(),
                total_tickets_number: donations.iter().map(|d| d.tickets_number).sum(),
                participant,
                donations,
            })
        })
        .collect();

    let total_tickets: i64 = players.iter().map(|p| p.total_tickets_number).sum();
    if players.is_empty() {
        return Err(StubError::NoParticipants);
    }

    // Weighted by tickets; a draw without any tickets falls back to uniform
    let winner_index = if total_tickets > 0 {
        let mut ticket = rand::thread_rng().gen_range(0..total_tickets);
        players
            .iter()
            .position(|p| {
                if ticket < p.total_tickets_number {
                    true
                } else {
                    ticket -= p.total_tickets_number;
                    false
                }
            })
            .unwrap_or(0)
    } else {
        rand::thread_rng().gen_range(0..players.len())
    };
    let winner = players.remove(winner_index);

    Ok(Json(PrizePlayResult {
        winners: vec![winner],
        participants: players,
    }))
}

// Donations

async fn list_donations(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id)): Path<(String, String)>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;
    let prize = entry.prize(&prize_id, "get prize")?;
    Ok(items(&prize.donations))
}

async fn create_donation(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id)): Path<(String, String)>,
    Json(req): Json<DonationRequest>,
) -> Result<Json<ResponseId>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get raffle")?;
    validate_donation("create donation", &req)?;
    if !entry.participants.iter().any(|p| p.id == req.participant_id) {
        return Err(StubError::NotFound("get participant"));
    }
    let prize = entry.prize(&prize_id, "get prize")?;

    let id = new_id();
    prize.donations.push(Donation {
        id: id.clone(),
        prize_id: prize_id.clone(),
        participant_id: req.participant_id,
        amount: req.amount,
        tickets_number: tickets(req.amount, prize.prize.ticket_cost),
        created_at: Utc::now(),
    });
    Ok(Json(ResponseId { id }))
}

async fn get_donation(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id, donation_id)): Path<(String, String, String)>,
) -> Result<Json<Donation>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get donation")?;
    let prize = entry.prize(&prize_id, "get donation")?;
    prize
        .donations
        .iter()
        .find(|d| d.id == donation_id)
        .cloned()
        .map(Json)
        .ok_or(StubError::NotFound("get donation"))
}

async fn update_donation(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id, donation_id)): Path<(String, String, String)>,
    Json(req): Json<DonationRequest>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "get donation")?;
    if !entry.participants.iter().any(|p| p.id == req.participant_id) {
        return Err(StubError::NotFound("get participant"));
    }
    let prize = entry.prize(&prize_id, "get donation")?;
    let cost = prize.prize.ticket_cost;
    let donation = prize
        .donations
        .iter_mut()
        .find(|d| d.id == donation_id)
        .ok_or(StubError::NotFound("get donation"))?;
    validate_donation("update donation", &req)?;
    donation.amount = req.amount;
    donation.participant_id = req.participant_id;
    donation.tickets_number = tickets(req.amount, cost);
    Ok(Json(json!({})))
}

async fn delete_donation(
    State(store): State<SharedStore>,
    Path((raffle_id, prize_id, donation_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, StubError> {
    let mut store = store.lock();
    let entry = store.raffle(&raffle_id, "deleting donation")?;
    let prize = entry.prize(&prize_id, "deleting donation")?;
    let before = prize.donations.len();
    prize.donations.retain(|d| d.id != donation_id);
    if prize.donations.len() == before {
        return Err(StubError::NotFound("deleting donation"));
    }
    Ok(Json(json!({})))
}

fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/api/raffles", get(list_raffles).post(create_raffle))
        .route("/api/raffles/:raffle_id", put(update_raffle).delete(delete_raffle))
        .route("/api/raffles/:raffle_id/download-xlsx", get(download_raffle))
        .route(
            "/api/raffles/:raffle_id/participants",
            get(list_participants).post(create_participant),
        )
        .route(
            "/api/raffles/:raffle_id/participants/:participant_id",
            put(update_participant).delete(delete_participant),
        )
        .route("/api/raffles/:raffle_id/prizes", get(list_prizes).post(create_prize))
        .route(
            "/api/raffles/:raffle_id/prizes/:prize_id",
            get(get_prize).put(update_prize).delete(delete_prize),
        )
        .route("/api/raffles/:raffle_id/prizes/:prize_id/play", get(play_prize))
        .route(
            "/api/raffles/:raffle_id/prizes/:prize_id/donations",
            get(list_donations).post(create_donation),
        )
        .route(
            "/api/raffles/:raffle_id/prizes/:prize_id/donations/:donation_id",
            get(get_donation).put(update_donation).delete(delete_donation),
        )
        .layer(middleware::from_fn(require_organizer))
        .with_state(store)
}

/// Handle for the running stub; dropping it shuts the server down
pub struct StubService {
    port: u16,
    base_url: String,
    store: SharedStore,
    shutdown: Option<oneshot::Sender<()>>,
    join: Option<thread::JoinHandle<()>>,
}

impl StubService {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn raffle_count(&self) -> usize {
        self.store.lock().raffles.len()
    }
}

impl Drop for StubService {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Bind an ephemeral port and serve the stub API from a background thread
pub fn spawn_stub_service() -> Result<StubService, String> {
    let listener =
        StdTcpListener::bind("127.0.0.1:0").map_err(|e| format!("stub bind failed: {e}"))?;
    listener
        .set_nonblocking(true)
        .map_err(|e| format!("stub listener nonblocking failed: {e}"))?;
    let port = listener
        .local_addr()
        .map_err(|e| format!("stub local addr failed: {e}"))?
        .port();

    let store = SharedStore::default();
    let app = router(store.clone());
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let join = thread::spawn(move || {
        let Ok(runtime) = Builder::new_multi_thread().worker_threads(2).enable_all().build() else {
            return;
        };
        runtime.block_on(async move {
            let Ok(listener) = tokio::net::TcpListener::from_std(listener) else {
                return;
            };
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });
    });

    Ok(StubService {
        port,
        base_url: format!("http://127.0.0.1:{port}"),
        store,
        shutdown: Some(shutdown_tx),
        join: Some(join),
    })
}
