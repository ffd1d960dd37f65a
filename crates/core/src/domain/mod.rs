pub mod quote_request;
