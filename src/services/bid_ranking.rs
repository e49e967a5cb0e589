//! Ranking de pujas
//!
//! Lógica pura de ordenación y determinación de la puja ganadora por
//! coche: importe descendente, y a igualdad de importe gana la colocada
//! antes, de modo que siempre hay a lo sumo una puja ganadora.

use chrono::{DateTime, Utc};

use crate::models::bid::Bid;
use crate::repositories::bid_repository::BidWithUserRow;

/// Acceso uniforme a los campos que determinan el ranking
pub trait RankedBid {
    fn amount(&self) -> i64;
    fn placed_at(&self) -> DateTime<Utc>;
}

impl RankedBid for Bid {
    fn amount(&self) -> i64 {
        self.amount
    }
    fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}

impl RankedBid for BidWithUserRow {
    fn amount(&self) -> i64 {
        self.amount
    }
    fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}

/// Ordenar pujas para presentación: importe descendente, empates por
/// instante de colocación ascendente.
pub fn sort_bids_for_display<B: RankedBid>(bids: &mut [B]) {
    bids.sort_by(|a, b| {
        b.amount()
            .cmp(&a.amount())
            .then_with(|| a.placed_at().cmp(&b.placed_at()))
    });
}

/// Importe más alto entre las pujas vigentes, o None si no hay pujas
pub fn highest_amount<B: RankedBid>(bids: &[B]) -> Option<i64> {
    bids.iter().map(|b| b.amount()).max()
}

/// Índice de la puja ganadora: máximo importe, empate resuelto por la
/// colocada antes. Exactamente una puja gana mientras haya alguna.
pub fn winning_index<B: RankedBid>(bids: &[B]) -> Option<usize> {
    let mut winner: Option<usize> = None;
    for (i, bid) in bids.iter().enumerate() {
        winner = match winner {
            None => Some(i),
            Some(w) => {
                let current = &bids[w];
                if bid.amount() > current.amount()
                    || (bid.amount() == current.amount() && bid.placed_at() < current.placed_at())
                {
                    Some(i)
                } else {
                    Some(w)
                }
            }
        };
    }
    winner
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn bid(amount: i64, placed_offset_s: i64) -> Bid {
        let now = Utc::now();
        Bid {
            id: Uuid::new_v4(),
            auction_id: Uuid::new_v4(),
            car_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            amount,
            is_winning: false,
            placed_at: now + Duration::seconds(placed_offset_s),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sort_amount_desc_then_placed_asc() {
        let mut bids = vec![bid(900, 0), bid(1100, 10), bid(1100, 5), bid(1000, 2)];
        sort_bids_for_display(&mut bids);
        let amounts: Vec<i64> = bids.iter().map(|b| b.amount).collect();
        assert_eq!(amounts, vec![1100, 1100, 1000, 900]);
        // a igualdad de importe, primero la colocada antes
        assert!(bids[0].placed_at < bids[1].placed_at);
    }

    #[test]
    fn test_highest_amount() {
        assert_eq!(highest_amount::<Bid>(&[]), None);
        let bids = vec![bid(500, 0), bid(1500, 1), bid(700, 2)];
        assert_eq!(highest_amount(&bids), Some(1500));
    }

    #[test]
    fn test_single_winner_on_ties_earliest_wins() {
        let first = bid(1100, 5);
        let second = bid(1100, 10);
        let bids = vec![second.clone(), first.clone(), bid(900, 0)];
        let winner = winning_index(&bids).unwrap();
        assert_eq!(bids[winner].id, first.id);
    }

    #[test]
    fn test_no_winner_without_bids() {
        assert_eq!(winning_index::<Bid>(&[]), None);
    }

    #[test]
    fn test_bidding_scenario_winner_moves() {
        // U1 puja 1000 y gana; U2 puja 1100 y pasa a ganar
        let u1 = bid(1000, 0);
        let bids = vec![u1.clone()];
        assert_eq!(winning_index(&bids), Some(0));
        assert_eq!(highest_amount(&bids), Some(1000));

        let u2 = bid(1100, 30);
        let bids = vec![u1.clone(), u2.clone()];
        let winner = winning_index(&bids).unwrap();
        assert_eq!(bids[winner].id, u2.id);
        assert_eq!(highest_amount(&bids), Some(1100));
    }
}
