mod checkin;
mod feedback;
mod reentrancy;
