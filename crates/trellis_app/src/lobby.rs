//! Party-game lobby.
//!
//! Players join by name, mark themselves ready, and once everyone is ready
//! the host starts a round. Starting a round emits `round-started` on the
//! root node; the lobby listens for it itself to show the round banner.

use engine_logging::engine_info;
use serde_json::{json, Value};
use trellis_core::{
    class, disabled, element, id, keyed, none, on_click, on_custom, on_input, on_submit,
    placeholder, text, type_, value, App, DecodeError, Effect, VNode,
};

pub const ROUND_STARTED: &str = "round-started";
const MIN_PLAYERS: usize = 2;

pub type PlayerId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lobby {
    pub room_code: String,
    pub players: Vec<Player>,
    pub draft: String,
    pub round: Option<usize>,
    next_id: PlayerId,
}

impl Lobby {
    fn seat(&mut self, name: &str) {
        self.next_id += 1;
        self.players.push(Player {
            id: self.next_id,
            name: name.to_string(),
            ready: false,
        });
    }

    pub fn can_start(&self) -> bool {
        self.round.is_none()
            && self.players.len() >= MIN_PLAYERS
            && self.players.iter().all(|player| player.ready)
    }
}

pub struct LobbyFlags {
    pub room_code: String,
    pub players: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    DraftChanged(String),
    Join,
    ToggleReady(PlayerId),
    Leave(PlayerId),
    Start,
    RoundStarted { players: usize },
}

pub fn app() -> App<LobbyFlags, Lobby, Msg> {
    App::new(init, update, view)
}

fn init(flags: LobbyFlags) -> (Lobby, Effect<Msg>) {
    let mut lobby = Lobby {
        room_code: flags.room_code,
        players: Vec::new(),
        draft: String::new(),
        round: None,
        next_id: 0,
    };
    for name in &flags.players {
        lobby.seat(name);
    }
    (lobby, Effect::none())
}

pub fn update(mut lobby: Lobby, msg: Msg) -> (Lobby, Effect<Msg>) {
    match msg {
        Msg::DraftChanged(draft) => lobby.draft = draft,
        Msg::Join => {
            let name = lobby.draft.trim().to_string();
            if !name.is_empty() {
                lobby.seat(&name);
                lobby.draft.clear();
            }
        }
        Msg::ToggleReady(player_id) => {
            if let Some(player) = lobby.players.iter_mut().find(|p| p.id == player_id) {
                player.ready = !player.ready;
            }
        }
        Msg::Leave(player_id) => lobby.players.retain(|p| p.id != player_id),
        Msg::Start if lobby.can_start() => {
            let payload = json!({
                "room": lobby.room_code,
                "players": lobby.players.len(),
            });
            return (
                lobby,
                Effect::from_fn(move |ctx| ctx.emit(ROUND_STARTED, payload)),
            );
        }
        Msg::Start => {}
        Msg::RoundStarted { players } => {
            engine_info!("round started in {} with {} players", lobby.room_code, players);
            lobby.round = Some(players);
        }
    }
    (lobby, Effect::none())
}

fn decode_round(detail: &Value) -> Result<Msg, DecodeError> {
    let players = detail
        .get("players")
        .and_then(Value::as_u64)
        .ok_or_else(|| DecodeError::Rejected("round-started without a player count".into()))?;
    Ok(Msg::RoundStarted {
        players: players as usize,
    })
}

pub fn view(lobby: &Lobby) -> VNode<Msg> {
    element(
        "main",
        vec![class("lobby"), on_custom(ROUND_STARTED, decode_round)],
        vec![
            element(
                "h1",
                vec![],
                vec![text(format!("Room {}", lobby.room_code))],
            ),
            element(
                "ul",
                vec![class("players")],
                lobby.players.iter().map(view_player).collect(),
            ),
            view_join_form(&lobby.draft),
            element(
                "button",
                vec![
                    class("start"),
                    disabled(!lobby.can_start()),
                    on_click(Msg::Start),
                ],
                vec![text("Start game")],
            ),
            match lobby.round {
                Some(players) => element(
                    "p",
                    vec![class("status")],
                    vec![text(format!("Round in progress with {players} players"))],
                ),
                None => none(),
            },
        ],
    )
}

fn view_player(player: &Player) -> VNode<Msg> {
    let row_class = if player.ready { "player ready" } else { "player" };
    keyed(
        player.id.to_string(),
        element(
            "li",
            vec![class(row_class)],
            vec![
                element("span", vec![], vec![text(player.name.clone())]),
                element(
                    "button",
                    vec![id(format!("ready-{}", player.id)), on_click(Msg::ToggleReady(player.id))],
                    vec![text(if player.ready { "Not ready" } else { "Ready" })],
                ),
                element(
                    "button",
                    vec![id(format!("leave-{}", player.id)), on_click(Msg::Leave(player.id))],
                    vec![text("Leave")],
                ),
            ],
        ),
    )
}

fn view_join_form(draft: &str) -> VNode<Msg> {
    element(
        "form",
        vec![on_submit(Msg::Join)],
        vec![
            element(
                "input",
                vec![
                    type_("text"),
                    placeholder("Your name"),
                    value(draft),
                    on_input(Msg::DraftChanged),
                ],
                vec![],
            ),
            element(
                "button",
                vec![type_("submit"), disabled(draft.trim().is_empty())],
                vec![text("Join")],
            ),
        ],
    )
}
