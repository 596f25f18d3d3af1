use super::*;
use crate::ID;
use crate::cards::Deck;
use crate::cards::Rank;
use crate::cards::Roulette;
use rand::Rng;
use rand::rngs::SmallRng;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

/// Central coordinator for one live game.
///
/// Owns the connection table, the seated roster, and the round state, and is
/// the single writer to all three. Key responsibilities:
///
/// - admit connections up to capacity and mint participant identities
/// - enforce stage and turn order; refuse everything else with a structured
///   error
/// - run fold/challenge resolution, the roulette draw, and win detection
/// - broadcast every effect only after the mutation it describes is complete
///
/// The room runs in its own task, draining one [`RoomEvent`] at a time, so
/// no transition ever observes another's intermediate state.
pub struct Room {
    id: ID<Room>,
    table: Table,
    roster: Vec<Participant>,
    stage: Stage,
    rng: SmallRng,
    events: UnboundedReceiver<RoomEvent>,
    occupied: bool,
}

/// Lifecycle of a room. `Over` is terminal; the flip into it is what
/// guarantees `game-over` goes out exactly once.
#[derive(Debug)]
pub enum Stage {
    Waiting,
    Playing(Round),
    Over,
}

/// Mutable state of the round in progress.
#[derive(Debug)]
pub struct Round {
    /// Rank every discard this round is claimed to match. Never the joker.
    pub target: Rank,
    /// Whose move it is. Always a live participant while any remain.
    pub turn: ID<Participant>,
    /// Who discarded last. Equal to `turn` when there is nothing to challenge.
    pub prev: ID<Participant>,
    /// Tags claimed by the last discard. Replaced, never appended.
    pub pile: Vec<Rank>,
}

impl Room {
    pub fn new(id: ID<Room>, events: UnboundedReceiver<RoomEvent>, rng: SmallRng) -> Self {
        Self {
            id,
            table: Table::default(),
            roster: Vec::new(),
            stage: Stage::Waiting,
            rng,
            events,
            occupied: false,
        }
    }

    /// Drains the event queue until the last connection is gone, then signals
    /// the registry through `done`. Rooms nobody ever entered only end with
    /// the process.
    pub async fn run(mut self, done: oneshot::Sender<()>) {
        log::debug!("[room {}] open", self.id);
        while let Some(event) = self.events.recv().await {
            for ghost in self.table.sweep() {
                log::debug!("[room {}] sweeping dead connection {}", self.id, ghost);
                self.disconnected(ghost);
            }
            self.handle(event);
            if self.occupied && self.table.is_empty() {
                break;
            }
        }
        let _ = done.send(());
        log::info!("[room {}] closed", self.id);
    }

    /// Runs one event to completion. Entirely synchronous; the queue is the
    /// room's mutual exclusion.
    fn handle(&mut self, event: RoomEvent) {
        log::debug!("[room {}] {}", self.id, event);
        match event {
            RoomEvent::Connected { outbox, reply } => self.connected(outbox, reply),
            RoomEvent::Frame { user, text } => self.frame(user, text),
            RoomEvent::Disconnected { user } => self.disconnected(user),
        }
    }
}

impl Room {
    fn connected(
        &mut self,
        outbox: UnboundedSender<String>,
        reply: oneshot::Sender<Result<ID<Participant>, GameError>>,
    ) {
        match self.table.connect(outbox) {
            Ok(user) => {
                self.occupied = true;
                self.table.unicast(user, &ServerMessage::connected(user));
                log::info!("[room {}] connection {} admitted", self.id, user);
                let _ = reply.send(Ok(user));
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        }
    }

    fn frame(&mut self, user: ID<Participant>, text: String) {
        match Protocol::decode(&text) {
            Ok(message) => self.apply(user, message),
            Err(e) => self.table.refuse(user, &e),
        }
    }

    fn apply(&mut self, user: ID<Participant>, message: ClientMessage) {
        match message {
            ClientMessage::JoinRoom { nickname } => self.join(user, nickname),
            ClientMessage::StartGame => self.start(user),
            ClientMessage::FoldCards { cards } => self.fold(user, cards),
            ClientMessage::CallBluff => self.call(user),
        }
    }

    fn disconnected(&mut self, user: ID<Participant>) {
        self.table.remove(user);
        let Some(pos) = self.roster.iter().position(|p| p.id == user) else {
            return;
        };
        let leaver = self.roster.remove(pos);
        log::info!("[room {}] {} left", self.id, leaver.nickname);
        self.table.broadcast(&ServerMessage::left(&self.roster));
        if let Stage::Playing(round) = &mut self.stage {
            let mut moved = false;
            if round.turn == user {
                if let Some(next) = next_live_at(&self.roster, pos) {
                    round.turn = next;
                    moved = true;
                }
            }
            if round.prev == user {
                // a departed discard cannot be challenged
                round.prev = round.turn;
                moved = true;
            }
            if moved {
                self.table
                    .broadcast(&ServerMessage::update_turn(round.turn, round.prev));
            }
        }
        if matches!(self.stage, Stage::Playing(_)) {
            if let Some(winner) = self.survivor() {
                self.table.broadcast(&ServerMessage::game_over(&winner));
                self.stage = Stage::Over;
                log::info!("[room {}] game over by forfeit, {} wins", self.id, winner);
            }
        }
    }
}

impl Room {
    fn join(&mut self, user: ID<Participant>, nickname: String) {
        if !matches!(self.stage, Stage::Waiting) {
            return self
                .table
                .refuse(user, &GameError::InvalidTransition("the game has started"));
        }
        if self.roster.iter().any(|p| p.id == user) {
            return self
                .table
                .refuse(user, &GameError::InvalidTransition("already seated"));
        }
        log::info!("[room {}] {} seated as {:?}", self.id, user, nickname);
        self.roster.push(Participant::new(user, nickname));
        self.table.broadcast(&ServerMessage::joined(&self.roster));
    }

    fn start(&mut self, user: ID<Participant>) {
        if !matches!(self.stage, Stage::Waiting) {
            return self
                .table
                .refuse(user, &GameError::InvalidTransition("the game has started"));
        }
        if !self.roster.iter().any(|p| p.id == user) {
            return self
                .table
                .refuse(user, &GameError::InvalidTransition("join the room first"));
        }
        if self.roster.len() < 2 {
            return self.table.refuse(
                user,
                &GameError::InvalidTransition("need at least two players"),
            );
        }
        let deck = Deck::shuffled(&mut self.rng);
        let Some(hands) = deck.deal(self.roster.len()) else {
            return self
                .table
                .broadcast(&ServerMessage::error(&GameError::InsufficientCards));
        };
        let target = Rank::target(&mut self.rng);
        let opener = self.rng.random_range(0..self.roster.len());
        let turn = self.roster[opener].id;
        for (participant, hand) in self.roster.iter_mut().zip(hands.iter()) {
            participant.redeal();
            self.table.unicast(
                participant.id,
                &ServerMessage::game_started(hand, turn, turn, target),
            );
        }
        for watcher in self.spectators() {
            self.table
                .unicast(watcher, &ServerMessage::game_started(&[], turn, turn, target));
        }
        self.stage = Stage::Playing(Round {
            target,
            turn,
            prev: turn,
            pile: Vec::new(),
        });
        log::info!(
            "[room {}] game started with {} players, target {}",
            self.id,
            self.roster.len(),
            target
        );
    }

    fn fold(&mut self, user: ID<Participant>, tags: Vec<Rank>) {
        let Stage::Playing(round) = &mut self.stage else {
            return self
                .table
                .refuse(user, &GameError::InvalidTransition("no round in progress"));
        };
        if round.turn != user {
            return self.table.refuse(user, &GameError::OutOfTurnAction);
        }
        let Some(actor) = self.roster.iter_mut().find(|p| p.id == user) else {
            return log::warn!("[room {}] turn holder {} not seated", self.id, user);
        };
        if tags.is_empty() || tags.len() > actor.cards_left {
            return self.table.refuse(
                user,
                &GameError::MalformedMessage(format!(
                    "cannot discard {} of {} cards",
                    tags.len(),
                    actor.cards_left
                )),
            );
        }
        // the claimed ranks are taken at face value; only the count is real
        actor.cards_left -= tags.len();
        actor.is_no_cards = actor.cards_left == 0;
        let standing = ServerMessage::update_participant(actor);
        round.prev = user;
        round.pile = tags;
        if let Some(next) = next_live(&self.roster, user) {
            round.turn = next;
        }
        self.table
            .broadcast(&ServerMessage::update_turn(round.turn, round.prev));
        self.table.broadcast(&standing);
        self.table
            .broadcast(&ServerMessage::table_cards(round.pile.len()));
    }

    fn call(&mut self, user: ID<Participant>) {
        let Stage::Playing(round) = &mut self.stage else {
            return self
                .table
                .refuse(user, &GameError::InvalidTransition("no round in progress"));
        };
        if round.turn != user {
            return self.table.refuse(user, &GameError::OutOfTurnAction);
        }
        if round.prev == round.turn {
            return self.table.refuse(
                user,
                &GameError::InvalidTransition("no discard to challenge"),
            );
        }
        let bluff = round.pile.iter().any(|tag| !tag.satisfies(round.target));
        let victim = if bluff { round.prev } else { user };
        let prior = round.turn;
        let Some(p) = self.roster.iter_mut().find(|p| p.id == victim) else {
            return log::warn!("[room {}] challenge victim {} not seated", self.id, victim);
        };
        if Roulette::pull(&mut self.rng, p.shots) {
            p.is_dead = true;
            log::info!(
                "[room {}] {} eliminated at {} shots",
                self.id,
                p.nickname,
                p.shots
            );
        } else {
            p.shots += 1;
            log::info!("[room {}] {} survived shot {}", self.id, p.nickname, p.shots);
        }
        let report = ServerMessage::update_participant(p);
        if let Some(winner) = self.champion() {
            return self.crown(report, winner);
        }
        // hand-out flags are transient; everyone re-enters rotation before
        // the next deal, which may itself decide the game
        self.roster.iter_mut().for_each(|p| p.is_no_cards = false);
        if let Some(winner) = self.champion() {
            return self.crown(report, winner);
        }
        self.redeal(report, prior);
    }
}

impl Room {
    /// Fresh target, fresh hands, fresh turn pointers after a challenge that
    /// decided nothing. Dead participants keep spectating with empty hands.
    fn redeal(&mut self, report: ServerMessage, prior: ID<Participant>) {
        let target = Rank::target(&mut self.rng);
        let deck = Deck::shuffled(&mut self.rng);
        let living = self.roster.iter().filter(|p| !p.is_dead).count();
        let mut hands = deck.deal(living).expect("capacity bounds the deck").into_iter();
        self.table.broadcast(&report);
        for participant in self.roster.iter_mut() {
            if participant.is_dead {
                self.table
                    .unicast(participant.id, &ServerMessage::start_round(&[], target));
            } else {
                let hand = hands.next().expect("one hand per living participant");
                participant.redeal();
                self.table
                    .unicast(participant.id, &ServerMessage::start_round(&hand, target));
            }
        }
        for watcher in self.spectators() {
            self.table
                .unicast(watcher, &ServerMessage::start_round(&[], target));
        }
        let turn = next_live(&self.roster, prior).unwrap_or(prior);
        if let Stage::Playing(round) = &mut self.stage {
            round.target = target;
            round.turn = turn;
            round.prev = turn;
            round.pile.clear();
        }
        self.table
            .broadcast(&ServerMessage::update_turn(turn, turn));
        log::info!("[room {}] new round, target {}", self.id, target);
    }

    /// Seals the room. The stage flip is what guards against a second
    /// `game-over` ever going out.
    fn crown(&mut self, report: ServerMessage, winner: String) {
        self.table.broadcast(&report);
        self.table.broadcast(&ServerMessage::game_over(&winner));
        self.stage = Stage::Over;
        log::info!("[room {}] game over, {} wins", self.id, winner);
    }

    /// Open connections without a seat at the game. They still get round
    /// headers, with empty hands.
    fn spectators(&self) -> Vec<ID<Participant>> {
        self.table
            .users()
            .filter(|u| !self.roster.iter().any(|p| p.id == *u))
            .collect()
    }

    /// The last nickname standing among rotation-eligible participants.
    fn champion(&self) -> Option<String> {
        let mut live = self.roster.iter().filter(|p| p.is_live());
        match (live.next(), live.next()) {
            (Some(p), None) => Some(p.nickname.clone()),
            _ => None,
        }
    }

    /// The last nickname standing among participants not yet eliminated.
    fn survivor(&self) -> Option<String> {
        let mut alive = self.roster.iter().filter(|p| !p.is_dead);
        match (alive.next(), alive.next()) {
            (Some(p), None) => Some(p.nickname.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CAPACITY;
    use crate::HAND_SIZE;
    use rand::SeedableRng;
    use serde_json::Value;
    use tokio::sync::mpsc::unbounded_channel;

    /// One scripted connection: its minted id and its outbound frames.
    #[derive(Debug)]
    struct Puppet {
        user: ID<Participant>,
        rx: UnboundedReceiver<String>,
    }

    impl Puppet {
        fn drain(&mut self) -> Vec<Value> {
            let mut frames = Vec::new();
            while let Ok(json) = self.rx.try_recv() {
                frames.push(serde_json::from_str(&json).expect("server frames are json"));
            }
            frames
        }
        fn last(&mut self, tag: &str) -> Option<Value> {
            self.drain().into_iter().rev().find(|v| v["type"] == tag)
        }
        fn count(&mut self, tag: &str) -> usize {
            self.drain().iter().filter(|v| v["type"] == tag).count()
        }
        fn say(&self, room: &mut Room, text: &str) {
            room.handle(RoomEvent::Frame {
                user: self.user,
                text: text.to_string(),
            });
        }
        fn fold(&self, room: &mut Room, tags: &[&str]) {
            let cards = tags
                .iter()
                .map(|t| format!("\"{}\"", t))
                .collect::<Vec<_>>()
                .join(",");
            self.say(room, &format!(r#"{{"type":"fold-cards","cards":[{}]}}"#, cards));
        }
    }

    fn room() -> Room {
        room_seeded(0xB1FF)
    }
    fn room_seeded(seed: u64) -> Room {
        let (_, events) = unbounded_channel();
        Room::new(ID::default(), events, SmallRng::seed_from_u64(seed))
    }

    fn connect(room: &mut Room) -> Puppet {
        admit(room).expect("room has capacity")
    }
    fn admit(room: &mut Room) -> Result<Puppet, GameError> {
        let (outbox, rx) = unbounded_channel();
        let (reply, mut admission) = tokio::sync::oneshot::channel();
        room.handle(RoomEvent::Connected { outbox, reply });
        admission
            .try_recv()
            .expect("room replies synchronously")
            .map(|user| Puppet { user, rx })
    }

    fn seat(room: &mut Room, nickname: &str) -> Puppet {
        let puppet = connect(room);
        puppet.say(
            room,
            &format!(r#"{{"type":"join-room","nickname":"{}"}}"#, nickname),
        );
        puppet
    }

    fn table_of(room: &mut Room, names: &[&str]) -> Vec<Puppet> {
        let mut puppets = names.iter().map(|n| seat(room, n)).collect::<Vec<_>>();
        puppets[0].say(room, r#"{"type":"start-game"}"#);
        puppets
    }

    /// Pins the round so challenge outcomes stop depending on the shuffle.
    fn rig(room: &mut Room, target: Rank, turn: usize, prev: usize, pile: &[Rank]) {
        let (turn, prev) = (room.roster[turn].id, room.roster[prev].id);
        let Stage::Playing(round) = &mut room.stage else {
            panic!("rig requires a running game");
        };
        round.target = target;
        round.turn = turn;
        round.prev = prev;
        round.pile = pile.to_vec();
    }

    #[test]
    fn connection_gets_private_ack() {
        let mut room = room();
        let mut a = connect(&mut room);
        let mut b = connect(&mut room);
        let ack = a.last("connected").expect("ack arrives first");
        assert_eq!(ack["userId"], a.user.to_string());
        assert_eq!(b.count("connected"), 1); // own ack only, not a's
    }

    #[test]
    fn fifth_connection_is_refused() {
        let mut room = room();
        let _seated = (0..CAPACITY).map(|_| connect(&mut room)).collect::<Vec<_>>();
        assert_eq!(admit(&mut room).unwrap_err(), GameError::RoomFull);
        assert_eq!(room.table.occupancy(), CAPACITY);
    }

    #[test]
    fn join_broadcasts_the_roster() {
        let mut room = room();
        let mut a = seat(&mut room, "ada");
        let mut b = seat(&mut room, "bob");
        let roster = b.last("participant-joined").unwrap();
        assert_eq!(roster["participants"].as_array().unwrap().len(), 2);
        assert_eq!(roster["participants"][0]["nickname"], "ada");
        assert_eq!(roster["participants"][1]["nickname"], "bob");
        assert_eq!(a.count("participant-joined"), 2); // once per join
    }

    #[test]
    fn duplicate_join_is_refused() {
        let mut room = room();
        let mut a = seat(&mut room, "ada");
        a.drain();
        a.say(&mut room, r#"{"type":"join-room","nickname":"ada2"}"#);
        assert_eq!(a.last("error").unwrap()["kind"], "invalid-transition");
        assert_eq!(room.roster.len(), 1);
    }

    #[test]
    fn join_after_start_is_refused() {
        let mut room = room();
        let _table = table_of(&mut room, &["ada", "bob"]);
        let mut late = connect(&mut room);
        late.say(&mut room, r#"{"type":"join-room","nickname":"eve"}"#);
        assert_eq!(late.last("error").unwrap()["kind"], "invalid-transition");
        assert_eq!(room.roster.len(), 2);
    }

    #[test]
    fn start_needs_two_players() {
        let mut room = room();
        let mut a = seat(&mut room, "ada");
        a.say(&mut room, r#"{"type":"start-game"}"#);
        assert_eq!(a.last("error").unwrap()["kind"], "invalid-transition");
        assert!(matches!(room.stage, Stage::Waiting));
    }

    #[test]
    fn start_requires_a_seat() {
        let mut room = room();
        let _a = seat(&mut room, "ada");
        let _b = seat(&mut room, "bob");
        let mut lurker = connect(&mut room);
        lurker.say(&mut room, r#"{"type":"start-game"}"#);
        assert_eq!(lurker.last("error").unwrap()["kind"], "invalid-transition");
        assert!(matches!(room.stage, Stage::Waiting));
    }

    #[test]
    fn start_deals_private_hands() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob", "cyd"]);
        let deals = table
            .iter_mut()
            .map(|p| p.last("game-started").expect("everyone is dealt"))
            .collect::<Vec<_>>();
        let mut seen = std::collections::HashSet::new();
        for deal in &deals {
            let hand = deal["cards"].as_array().unwrap();
            assert_eq!(hand.len(), HAND_SIZE);
            for card in hand {
                assert!(seen.insert(card["id"].as_str().unwrap().to_string()));
            }
            assert_eq!(deal["targetType"], deals[0]["targetType"]);
            assert_eq!(deal["currentTurn"], deal["prevTurn"]);
            assert_eq!(deal["currentTurn"], deals[0]["currentTurn"]);
        }
        assert_ne!(deals[0]["targetType"], "joker");
        let turn = deals[0]["currentTurn"].as_str().unwrap();
        assert!(room.roster.iter().any(|p| p.id.to_string() == turn));
        assert!(matches!(room.stage, Stage::Playing(_)));
    }

    #[test]
    fn spectators_get_the_round_header_but_no_cards() {
        let mut room = room();
        let _a = seat(&mut room, "ada");
        let mut b = seat(&mut room, "bob");
        let mut lurker = connect(&mut room);
        b.say(&mut room, r#"{"type":"start-game"}"#);
        let header = lurker.last("game-started").expect("headers reach everyone");
        assert_eq!(header["cards"].as_array().unwrap().len(), 0);
        assert_eq!(
            header["targetType"],
            b.last("game-started").unwrap()["targetType"]
        );
    }

    #[test]
    fn second_start_is_refused() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        table[1].say(&mut room, r#"{"type":"start-game"}"#);
        assert_eq!(table[1].last("error").unwrap()["kind"], "invalid-transition");
    }

    #[test]
    fn fold_requires_the_turn() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        rig(&mut room, Rank::Queen, 0, 0, &[]);
        table[1].drain();
        table[1].fold(&mut room, &["queen"]);
        assert_eq!(table[1].last("error").unwrap()["kind"], "out-of-turn-action");
    }

    #[test]
    fn fold_moves_the_turn_and_conceals_the_tags() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob", "cyd"]);
        rig(&mut room, Rank::Queen, 0, 0, &[]);
        table.iter_mut().for_each(|p| {
            p.drain();
        });
        table[0].fold(&mut room, &["queen", "king"]);
        let frames = table[2].drain();
        let turn = frames.iter().find(|v| v["type"] == "update-turn").unwrap();
        assert_eq!(turn["currentTurn"], table[1].user.to_string());
        assert_eq!(turn["prevTurn"], table[0].user.to_string());
        let standing = frames
            .iter()
            .find(|v| v["type"] == "update-participant")
            .unwrap();
        assert_eq!(standing["userId"], table[0].user.to_string());
        assert_eq!(standing["isNoCards"], false);
        let pile = frames
            .iter()
            .find(|v| v["type"] == "update-table-cards")
            .unwrap();
        assert_eq!(pile["cardsCount"], 2);
        assert!(frames.iter().all(|v| v.get("cards").is_none()));
        let Stage::Playing(round) = &room.stage else {
            panic!("still playing")
        };
        assert_eq!(round.pile, vec![Rank::Queen, Rank::King]);
        assert_eq!(room.roster[0].cards_left, 3);
    }

    #[test]
    fn folding_the_whole_hand_leaves_rotation() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob", "cyd"]);
        rig(&mut room, Rank::Queen, 0, 0, &[]);
        table[0].fold(
            &mut room,
            &["queen", "queen", "queen", "queen", "queen"],
        );
        let standing = table[1].last("update-participant").unwrap();
        assert_eq!(standing["isNoCards"], true);
        assert!(!room.roster[0].is_live());
        // next fold skips straight past the emptied hand
        rig(&mut room, Rank::Queen, 2, 2, &[]);
        table[2].fold(&mut room, &["queen"]);
        let Stage::Playing(round) = &room.stage else {
            panic!("still playing")
        };
        assert_eq!(round.turn, table[1].user);
    }

    #[test]
    fn overdrawn_fold_is_refused() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        rig(&mut room, Rank::Queen, 0, 0, &[]);
        table[0].fold(&mut room, &["ace", "ace", "ace", "ace", "ace", "ace"]);
        assert_eq!(
            table[0].last("error").unwrap()["kind"],
            "malformed-message"
        );
        assert_eq!(room.roster[0].cards_left, HAND_SIZE);
    }

    #[test]
    fn empty_fold_is_refused() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        rig(&mut room, Rank::Queen, 0, 0, &[]);
        table[0].fold(&mut room, &[]);
        assert_eq!(table[0].last("error").unwrap()["kind"], "malformed-message");
    }

    #[test]
    fn challenge_needs_a_discard() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        rig(&mut room, Rank::Queen, 1, 1, &[]);
        table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
        assert_eq!(
            table[1].last("error").unwrap()["kind"],
            "invalid-transition"
        );
    }

    #[test]
    fn exposed_bluff_punishes_the_folder() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        rig(&mut room, Rank::Queen, 1, 0, &[Rank::King, Rank::Joker]);
        room.roster[0].shots = crate::MAX_SHOTS; // folder's next draw is certain
        table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
        let verdict = table[1].drain();
        let standing = verdict
            .iter()
            .find(|v| v["type"] == "update-participant")
            .unwrap();
        assert_eq!(standing["userId"], table[0].user.to_string());
        assert_eq!(standing["isDead"], true);
        let over = verdict.iter().find(|v| v["type"] == "game-over").unwrap();
        assert_eq!(over["winner"], "bob");
        assert!(matches!(room.stage, Stage::Over));
    }

    #[test]
    fn honest_discard_punishes_the_challenger() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        rig(&mut room, Rank::Queen, 1, 0, &[Rank::Queen, Rank::Joker]);
        room.roster[1].shots = crate::MAX_SHOTS; // challenger's draw is certain
        table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
        let over = table[0].last("game-over").unwrap();
        assert_eq!(over["winner"], "ada");
        assert!(room.roster[1].is_dead);
        assert!(!room.roster[0].is_dead);
    }

    #[test]
    fn game_over_happens_exactly_once() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        rig(&mut room, Rank::Queen, 1, 0, &[Rank::King]);
        room.roster[0].shots = crate::MAX_SHOTS;
        table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
        // the room is sealed; further actions are refusals, not repeats
        table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
        table[0].fold(&mut room, &["queen"]);
        assert_eq!(table[1].count("game-over"), 1);
        assert_eq!(table[0].count("game-over"), 1);
    }

    #[test]
    fn undecided_challenge_starts_a_fresh_round() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob", "cyd", "dee"]);
        rig(&mut room, Rank::Queen, 1, 0, &[Rank::King]);
        room.roster[0].shots = crate::MAX_SHOTS; // ada is eliminated, three remain
        room.roster[3].is_no_cards = true; // cleared by the new round
        table.iter_mut().for_each(|p| {
            p.drain();
        });
        table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
        assert!(room.roster[0].is_dead);
        assert!(room.roster.iter().all(|p| !p.is_no_cards));
        // survivors get five fresh cards, the dead spectate empty-handed
        let dead_hand = table[0].last("start-round").unwrap();
        assert_eq!(dead_hand["cards"].as_array().unwrap().len(), 0);
        for puppet in &mut table[1..] {
            let round = puppet.last("start-round").unwrap();
            assert_eq!(round["cards"].as_array().unwrap().len(), HAND_SIZE);
        }
        assert!(room.roster[1..].iter().all(|p| p.cards_left == HAND_SIZE));
        let Stage::Playing(round) = &room.stage else {
            panic!("three players remain")
        };
        // next live after the challenger, with nothing yet to challenge
        assert_eq!(round.turn, table[2].user);
        assert_eq!(round.prev, round.turn);
        assert!(round.pile.is_empty());
        assert_eq!(table[1].count("game-over"), 0);
    }

    #[test]
    fn lone_live_participant_wins_even_out_of_cards_company() {
        // ada dead, cyd out of cards: bob is the only one left in rotation,
        // so the draw that spares the victim still decides the game
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob", "cyd"]);
        rig(&mut room, Rank::Queen, 1, 0, &[Rank::King]);
        room.roster[0].shots = crate::MAX_SHOTS;
        room.roster[2].is_no_cards = true;
        table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
        let over = table[2].last("game-over").unwrap();
        assert_eq!(over["winner"], "bob");
        assert!(matches!(room.stage, Stage::Over));
    }

    #[test]
    fn roulette_outcomes_keep_the_books_straight() {
        for seed in 0..64 {
            let mut room = room_seeded(seed);
            let mut table = table_of(&mut room, &["ada", "bob", "cyd"]);
            rig(&mut room, Rank::Queen, 1, 0, &[Rank::King]);
            table[1].say(&mut room, r#"{"type":"call-bluff"}"#);
            let victim = &room.roster[0];
            // either the draw landed or the near-miss was recorded, never both
            assert!(victim.is_dead ^ (victim.shots == 1));
            assert!(matches!(room.stage, Stage::Playing(_)));
            let report = table[2].last("update-participant").unwrap();
            assert_eq!(report["userId"], victim.id.to_string());
            assert_eq!(report["isDead"].as_bool().unwrap(), victim.is_dead);
        }
    }

    #[test]
    fn malformed_frames_get_a_structured_refusal() {
        let mut room = room();
        let mut a = seat(&mut room, "ada");
        let mut b = seat(&mut room, "bob");
        b.drain();
        a.say(&mut room, "certainly not json");
        assert_eq!(a.last("error").unwrap()["kind"], "malformed-message");
        assert!(b.drain().is_empty()); // refusals go to the offender alone
    }

    #[test]
    fn leaver_updates_the_roster() {
        let mut room = room();
        let mut a = seat(&mut room, "ada");
        let b = seat(&mut room, "bob");
        room.handle(RoomEvent::Disconnected { user: b.user });
        let left = a.last("participant-left").unwrap();
        assert_eq!(left["participants"].as_array().unwrap().len(), 1);
        assert_eq!(left["participants"][0]["nickname"], "ada");
        assert_eq!(room.table.occupancy(), 1);
    }

    #[test]
    fn turn_holder_leaving_advances_the_turn() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob", "cyd"]);
        rig(&mut room, Rank::Queen, 0, 0, &[]);
        table.iter_mut().for_each(|p| {
            p.drain();
        });
        let leaver = table.remove(0);
        room.handle(RoomEvent::Disconnected { user: leaver.user });
        let turn = table[0].last("update-turn").unwrap();
        assert_eq!(turn["currentTurn"], table[0].user.to_string());
        assert_eq!(turn["prevTurn"], table[0].user.to_string());
        assert!(matches!(room.stage, Stage::Playing(_)));
    }

    #[test]
    fn forfeit_down_to_one_ends_the_game() {
        let mut room = room();
        let mut table = table_of(&mut room, &["ada", "bob"]);
        let leaver = table.remove(1);
        room.handle(RoomEvent::Disconnected { user: leaver.user });
        let over = table[0].last("game-over").unwrap();
        assert_eq!(over["winner"], "ada");
        assert!(matches!(room.stage, Stage::Over));
    }

    #[tokio::test]
    async fn the_actor_drains_until_the_room_empties() {
        let (events, rx) = unbounded_channel();
        let room = Room::new(ID::default(), rx, SmallRng::seed_from_u64(0));
        let (done, closed) = tokio::sync::oneshot::channel();
        tokio::spawn(room.run(done));

        let (outbox, mut socket) = unbounded_channel();
        let (reply, admission) = tokio::sync::oneshot::channel();
        events
            .send(RoomEvent::Connected { outbox, reply })
            .expect("room is listening");
        let user = admission
            .await
            .expect("room replies")
            .expect("room has capacity");
        let ack: Value =
            serde_json::from_str(&socket.recv().await.expect("ack arrives")).unwrap();
        assert_eq!(ack["type"], "connected");
        assert_eq!(ack["userId"], user.to_string());

        events
            .send(RoomEvent::Disconnected { user })
            .expect("room is listening");
        closed.await.expect("room closes after its last connection");
    }
}
