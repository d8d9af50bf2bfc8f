mod fixtures;

mod notifications;
mod profile;
mod submissions;
mod tasks;
