mod live;
mod login;
mod notes;
