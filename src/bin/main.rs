fn main() {
    powminer::main();
}
