fn main() {
    panelgate::run();
}
