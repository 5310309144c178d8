mod test_closures;
mod test_control_flow;
mod test_end_to_end;
mod test_parser;
mod test_scanner;
mod test_tables;
mod test_vm_core;
