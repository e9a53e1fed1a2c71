pub mod conduct_draw;
pub mod refresh_fund;
