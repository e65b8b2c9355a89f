use afterstate::tictactoe::{BoardState, Judgment, PASS, Player, Variant};

fn board(variant: Variant, s: &str) -> BoardState {
    BoardState::from_string(variant, s).expect("valid board string")
}

fn every_state(variant: Variant) -> impl Iterator<Item = BoardState> {
    (0..variant.codespace())
        .map(move |code| BoardState::decode(variant, code).expect("code inside the codespace"))
}

#[test]
fn codes_round_trip_over_the_whole_codespace() {
    for variant in Variant::ALL {
        for code in 0..variant.codespace() {
            let state = BoardState::decode(variant, code).expect("decodable");
            assert_eq!(state.code(), code, "{variant} code {code}");
            assert_eq!(board(variant, &state.label()), state);
        }
        assert!(BoardState::decode(variant, variant.codespace()).is_err());
    }
}

#[test]
fn reversal_is_an_involution() {
    for variant in Variant::ALL {
        for state in every_state(variant) {
            let reversed = state.reverse();
            assert_eq!(reversed.reverse(), state);
            assert_eq!(reversed.passed(), state.passed());
            assert_eq!(reversed.piece_counts(), {
                let (x, o) = state.piece_counts();
                (o, x)
            });
        }
    }
}

#[test]
fn reversal_swaps_the_winner() {
    for variant in Variant::ALL {
        for state in every_state(variant) {
            assert_eq!(
                state.reverse().judgment(),
                state.judgment().swap_players(),
                "{}",
                state.label()
            );
        }
    }
}

#[test]
fn terminal_states_are_exactly_those_without_legal_actions() {
    for variant in Variant::ALL {
        for state in every_state(variant) {
            assert_eq!(
                state.is_terminal(),
                state.legal_actions().is_empty(),
                "{variant} {}",
                state.label()
            );
        }
    }
}

#[test]
fn completing_the_top_row_wins() {
    let state = board(Variant::Standard, "XX.OO....");
    let after = state.apply(2).expect("cell 2 is free");

    assert_eq!(after.label(), "XXXOO....");
    assert_eq!(after.judgment(), Judgment::Win(Player::X));
    assert!(after.legal_actions().is_empty());
}

#[test]
fn filling_the_last_cell_without_a_line_draws() {
    let state = board(Variant::Standard, "XOXXOOOX.");
    let after = state.apply(8).expect("cell 8 is free");

    assert_eq!(after.judgment(), Judgment::Draw);
    assert!(after.is_terminal());
}

#[test]
fn both_players_holding_a_line() {
    assert_eq!(
        board(Variant::Standard, "XXXOOO...").judgment(),
        Judgment::Impossible
    );
    assert_eq!(
        board(Variant::Capture, "XXXOOO...").judgment(),
        Judgment::Draw
    );
}

#[test]
fn capture_flips_every_neighbour() {
    // Placing at 0 touches 1, 3 and 4; 3 is empty and stays empty
    let state = board(Variant::Capture, ".O..O....");
    let after = state.apply(0).expect("cell 0 is free");
    assert_eq!(after.label(), "XX..X....");

    // Own markers flip too
    let state = board(Variant::Capture, "X.X.O.X.X");
    let after = state.apply(1).expect("cell 1 is free");
    assert_eq!(after.label(), "OXO.X.X.X");

    let state = board(Variant::Capture, "X...O...X");
    let after = state.apply(5).expect("cell 5 is free");
    assert_eq!(after.label(), "X...XX..O");
}

#[test]
fn capture_without_neighbours_flips_nothing() {
    let state = board(Variant::Capture, "O.....X..");
    let after = state.apply(8).expect("cell 8 is free");
    assert_eq!(after.label(), "O.....X.X");
}

#[test]
fn capture_can_complete_a_line_by_flipping() {
    let state = board(Variant::Capture, "O.O......");
    let after = state.apply(1).expect("cell 1 is free");

    assert_eq!(after.label(), "XXX......");
    assert_eq!(after.judgment(), Judgment::Win(Player::X));
}

#[test]
fn pass_rules() {
    let initial = Variant::Capture.initial_state();
    assert!(initial.passed());
    assert!(!initial.legal_actions().contains(&PASS));
    assert!(initial.apply(PASS).is_err());

    // After a placement the opponent may pass once
    let reply = initial.apply(4).expect("centre is free").reverse();
    assert!(!reply.passed());
    assert!(reply.legal_actions().contains(&PASS));

    let passed = reply.apply(PASS).expect("pass is legal").reverse();
    assert!(passed.passed());
    assert_eq!(passed.code(), reply.reverse().code() + 19_683);
    assert!(passed.apply(PASS).is_err());

    assert!(!board(Variant::Standard, ".........").is_legal(PASS));
    assert!(BoardState::from_string(Variant::Standard, ".........p").is_err());
}
