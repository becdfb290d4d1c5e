use chess::{Board, Color, Piece, Square};

/// Convert a chess Color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Parse `"white"` / `"black"` in any case
pub fn color_from_str(name: &str) -> Option<Color> {
    match name.to_ascii_lowercase().as_str() {
        "white" => Some(Color::White),
        "black" => Some(Color::Black),
        _ => None,
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "Pawn",
        Piece::Knight => "Knight",
        Piece::Bishop => "Bishop",
        Piece::Rook => "Rook",
        Piece::Queen => "Queen",
        Piece::King => "King",
    }
}

pub fn piece_plural(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "Pawns",
        Piece::Knight => "Knights",
        Piece::Bishop => "Bishops",
        Piece::Rook => "Rooks",
        Piece::Queen => "Queens",
        Piece::King => "King",
    }
}

/// Squares holding `piece` of `color`, in a1..h8 order
pub fn squares_of(board: &Board, color: Color, piece: Piece) -> Vec<Square> {
    let mut squares = Vec::new();
    for square in chess::ALL_SQUARES {
        if board.piece_on(square) == Some(piece) && board.color_on(square) == Some(color) {
            squares.push(square);
        }
    }
    squares
}

/// Knights, bishops, rooks and queens of `color`
pub fn non_pawn_count(board: &Board, color: Color) -> u32 {
    let mut count = 0;
    for square in chess::ALL_SQUARES {
        if board.color_on(square) != Some(color) {
            continue;
        }
        match board.piece_on(square) {
            Some(Piece::Knight) | Some(Piece::Bishop) | Some(Piece::Rook) | Some(Piece::Queen) => {
                count += 1
            }
            _ => {}
        }
    }
    count
}
