use rand::Rng;

pub const TICKET_PREFIX: &str = "LT-";

/// Investment (in cents) that buys one ticket.
pub const CENTS_PER_TICKET: i64 = 1_000;

const LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8; 10] = b"0123456789";

/// One ticket per $10 invested, at least one per qualifying investment.
pub fn ticket_count(investment_amount: i64) -> usize {
    (investment_amount / CENTS_PER_TICKET).max(1) as usize
}

/// Generate a ticket label like `LT-ABC123`.
pub fn generate_ticket<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut ticket = String::with_capacity(TICKET_PREFIX.len() + 6);
    ticket.push_str(TICKET_PREFIX);
    for _ in 0..3 {
        ticket.push(LETTERS[rng.gen_range(0..LETTERS.len())] as char);
    }
    for _ in 0..3 {
        ticket.push(DIGITS[rng.gen_range(0..DIGITS.len())] as char);
    }
    ticket
}

pub fn generate_tickets<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    (0..count).map(|_| generate_ticket(rng)).collect()
}

pub fn is_valid_ticket(ticket: &str) -> bool {
    let Some(body) = ticket.strip_prefix(TICKET_PREFIX) else {
        return false;
    };
    let bytes = body.as_bytes();
    bytes.len() == 6
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3..].iter().all(u8::is_ascii_digit)
}
