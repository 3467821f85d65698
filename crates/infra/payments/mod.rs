pub mod checkout_client;
