mod callback;
mod helpers;
mod mocks;
mod payments;
mod status;
